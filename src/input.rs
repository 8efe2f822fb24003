//! Keyboard and mouse → session `Input`s, one frame at a time.

use macroquad::prelude::*;

use discogsnake::session::{SearchStatus, Session, State};
use discogsnake::{Direction, Input};

use crate::render::{Viewport, buttons_for, result_row};

const TURNS: [(KeyCode, KeyCode, Direction); 4] = [
    (KeyCode::Up, KeyCode::W, Direction::Up),
    (KeyCode::Down, KeyCode::S, Direction::Down),
    (KeyCode::Left, KeyCode::A, Direction::Left),
    (KeyCode::Right, KeyCode::D, Direction::Right),
];

pub fn poll(session: &Session, vp: &Viewport) -> Vec<Input> {
    let mut out = Vec::new();
    if is_quit_requested() {
        out.push(Input::Quit);
        return out;
    }

    let state = session.state();
    if let State::Searching(_) = state {
        while let Some(c) = get_char_pressed() {
            if !c.is_control() {
                out.push(Input::Text(c));
            }
        }
        if is_key_pressed(KeyCode::Backspace) {
            out.push(Input::Backspace);
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            out.push(Input::Submit);
        }
        if is_key_pressed(KeyCode::Escape) {
            out.push(Input::Back);
        }
    } else {
        // Keep keystrokes from other screens out of the search box.
        while get_char_pressed().is_some() {}

        if is_key_pressed(KeyCode::Q) {
            out.push(Input::Quit);
        }
        if is_key_pressed(KeyCode::Escape) {
            out.push(Input::Back);
        }
        for (arrow, letter, dir) in TURNS {
            if is_key_pressed(arrow) || is_key_pressed(letter) {
                out.push(Input::Turn(dir));
            }
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::Space) {
            out.push(Input::Confirm);
        }
        if is_key_pressed(KeyCode::R) {
            out.push(Input::Retry);
        }
        if is_key_pressed(KeyCode::N) {
            out.push(Input::NewGame);
        }
    }

    if is_mouse_button_pressed(MouseButton::Left) {
        click(state, vp.to_logical(mouse_position()), vp, &mut out);
    }
    out
}

fn click(state: &State, at: Vec2, vp: &Viewport, out: &mut Vec<Input>) {
    if let Some(button) = buttons_for(state).iter().find(|b| b.rect(vp).contains(at)) {
        out.push(button.input());
        return;
    }
    match state {
        State::Searching(screen) => {
            if let SearchStatus::Results(albums) = &screen.status {
                if let Some(i) = (0..albums.len()).find(|&i| result_row(i, vp).contains(at)) {
                    out.push(Input::Select(i));
                }
            }
        }
        State::ClickToStart | State::ClickToContinue(_) => out.push(Input::Confirm),
        _ => {}
    }
}
