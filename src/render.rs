//! Drawing. All layout is in logical board pixels and scaled through a
//! `Viewport` so the board keeps its aspect ratio on any window.

use std::collections::HashMap;

use macroquad::prelude::*;

use discogsnake::cover;
use discogsnake::grid::Cell;
use discogsnake::session::{Game, Outcome, SearchScreen, SearchStatus, Session, State};
use discogsnake::{Album, Input};

const BACKGROUND: Color = Color::new(0.06, 0.06, 0.08, 1.0);
const PLAYFIELD: Color = Color::new(0.11, 0.11, 0.14, 1.0);
const SNAKE_HEAD: Color = Color::new(0.55, 0.95, 0.45, 1.0);
const SNAKE_BODY: Color = Color::new(0.25, 0.75, 0.3, 1.0);
const FOOD: Color = Color::new(0.95, 0.3, 0.3, 1.0);
const ACCENT: Color = Color::new(0.95, 0.8, 0.3, 1.0);
const MUTED: Color = Color::new(0.6, 0.6, 0.65, 1.0);
const BUTTON: Color = Color::new(0.2, 0.22, 0.3, 1.0);
const DIM: Color = Color::new(0.0, 0.0, 0.0, 0.55);

const THUMB_SIZE: u32 = 48;
const ROW_HEIGHT: f32 = 64.0;
const ROWS_TOP: f32 = 170.0;

/// Uniform scale and centring offset from logical to screen pixels.
#[derive(Copy, Clone, Debug)]
pub struct Viewport {
    pub scale: f32,
    pub off_x: f32,
    pub off_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn fit(width: f32, height: f32) -> Self {
        let sw = screen_width();
        let sh = screen_height();
        let scale = (sw / width).min(sh / height).max(0.01);
        Self {
            scale,
            off_x: (sw - width * scale) * 0.5,
            off_y: (sh - height * scale) * 0.5,
            width,
            height,
        }
    }

    pub fn to_screen(&self, r: Rect) -> Rect {
        Rect::new(self.off_x + r.x * self.scale, self.off_y + r.y * self.scale, r.w * self.scale, r.h * self.scale)
    }

    pub fn to_logical(&self, (x, y): (f32, f32)) -> Vec2 {
        vec2((x - self.off_x) / self.scale, (y - self.off_y) / self.scale)
    }

    fn fill(&self, r: Rect, color: Color) {
        let s = self.to_screen(r);
        draw_rectangle(s.x, s.y, s.w, s.h, color);
    }

    fn text(&self, text: &str, x: f32, y: f32, size: f32, color: Color) {
        draw_text(text, self.off_x + x * self.scale, self.off_y + y * self.scale, size * self.scale, color);
    }

    fn centered(&self, text: &str, y: f32, size: f32, color: Color) {
        let m = measure_text(text, None, size as u16, 1.0);
        self.text(text, (self.width - m.width) * 0.5, y, size, color);
    }

    fn texture(&self, tex: &Texture2D, r: Rect, tint: Color) {
        let s = self.to_screen(r);
        draw_texture_ex(tex, s.x, s.y, tint, DrawTextureParams { dest_size: Some(vec2(s.w, s.h)), ..Default::default() });
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    PlayGame,
    BackToMenu,
    PlayAgain,
    NewAlbum,
    MainMenu,
    Quit,
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::PlayGame => "PLAY GAME",
            Button::BackToMenu => "BACK TO MENU",
            Button::PlayAgain => "PLAY AGAIN",
            Button::NewAlbum => "NEW ALBUM",
            Button::MainMenu => "MAIN MENU",
            Button::Quit => "QUIT",
        }
    }

    pub fn input(self) -> Input {
        match self {
            Button::PlayGame => Input::Confirm,
            Button::BackToMenu | Button::MainMenu => Input::Back,
            Button::PlayAgain => Input::Retry,
            Button::NewAlbum => Input::NewGame,
            Button::Quit => Input::Quit,
        }
    }

    /// Logical rect of this button on a `vp`-sized board.
    pub fn rect(self, vp: &Viewport) -> Rect {
        let w = 220.0;
        let h = 44.0;
        let x = (vp.width - w) * 0.5;
        let y = match self {
            Button::PlayGame => vp.height * 0.55,
            Button::BackToMenu => vp.height - h - 24.0,
            Button::PlayAgain => vp.height * 0.5,
            Button::NewAlbum => vp.height * 0.5 + 56.0,
            Button::MainMenu => vp.height * 0.5 + 112.0,
            Button::Quit => vp.height * 0.5 + 168.0,
        };
        Rect::new(x, y, w, h)
    }
}

pub fn buttons_for(state: &State) -> &'static [Button] {
    match state {
        State::Menu => &[Button::PlayGame],
        State::Searching(_) => &[Button::BackToMenu],
        State::GameOver | State::Win => &[Button::PlayAgain, Button::NewAlbum, Button::MainMenu, Button::Quit],
        _ => &[],
    }
}

/// Logical rect of the `index`th search result row.
pub fn result_row(index: usize, vp: &Viewport) -> Rect {
    Rect::new(40.0, ROWS_TOP + index as f32 * ROW_HEIGHT, vp.width - 80.0, ROW_HEIGHT - 8.0)
}

/// GPU copies of the current tile set and of the search thumbnails.
#[derive(Default)]
pub struct TextureCache {
    version: u64,
    tiles: HashMap<Cell, Texture2D>,
    thumbs: HashMap<String, Texture2D>,
}

fn upload(bmp: &discogsnake::Bitmap) -> Texture2D {
    let tex = Texture2D::from_rgba8(bmp.width() as u16, bmp.height() as u16, bmp.rgba());
    tex.set_filter(FilterMode::Nearest);
    tex
}

impl TextureCache {
    /// Re-uploads tiles when the session installed a new tile set.
    pub fn sync(&mut self, session: &Session) {
        if session.tiles_version() == self.version {
            return;
        }
        self.tiles.clear();
        if let Some(set) = session.tiles() {
            for (cell, bmp) in set.iter() {
                self.tiles.insert(cell, upload(bmp));
            }
        }
        self.version = session.tiles_version();
    }

    fn thumb(&mut self, album: &Album) -> &Texture2D {
        self.thumbs
            .entry(album.id.clone())
            .or_insert_with(|| upload(&cover::placeholder(THUMB_SIZE, THUMB_SIZE, cover::seed_for(&album.id))))
    }
}

pub fn draw(session: &Session, textures: &mut TextureCache, vp: &Viewport) {
    clear_background(BACKGROUND);
    vp.fill(Rect::new(0.0, 0.0, vp.width, vp.height), PLAYFIELD);

    match session.state() {
        State::Menu => draw_menu(vp),
        State::Searching(screen) => draw_search(screen, textures, vp),
        State::Loading => {
            let title = session.album().map_or("album", |a| a.title.as_str());
            vp.centered("Loading cover...", vp.height * 0.45, 32.0, ACCENT);
            vp.centered(title, vp.height * 0.45 + 36.0, 20.0, MUTED);
        }
        State::ClickToStart => {
            draw_game(session, textures, vp);
            overlay(vp, "Click or press Enter to start", "Arrows/WASD to steer");
        }
        State::Playing => {
            draw_game(session, textures, vp);
            draw_hud(session, vp);
        }
        State::ClickToContinue(outcome) => {
            draw_game(session, textures, vp);
            draw_hud(session, vp);
            let title = match outcome {
                Outcome::Lost => "Crashed!",
                Outcome::Won => "Album complete!",
            };
            overlay(vp, title, "Click to continue");
        }
        State::GameOver => {
            draw_game(session, textures, vp);
            vp.fill(Rect::new(0.0, 0.0, vp.width, vp.height), DIM);
            draw_result(session, "GAME OVER", vp);
        }
        State::Win => {
            draw_cover(textures, vp, WHITE);
            vp.fill(Rect::new(0.0, 0.0, vp.width, vp.height), DIM);
            draw_result(session, "YOU WIN!", vp);
        }
        State::Terminated => {}
    }

    draw_buttons(buttons_for(session.state()), vp);
}

fn draw_buttons(buttons: &[Button], vp: &Viewport) {
    let hover = vp.to_logical(mouse_position());
    for button in buttons {
        let r = button.rect(vp);
        let fill = if r.contains(hover) { ACCENT } else { BUTTON };
        vp.fill(r, fill);
        let s = vp.to_screen(r);
        draw_rectangle_lines(s.x, s.y, s.w, s.h, 2.0, MUTED);
        let m = measure_text(button.label(), None, 22, 1.0);
        let text = if r.contains(hover) { BLACK } else { WHITE };
        vp.text(button.label(), r.x + (r.w - m.width) * 0.5, r.y + r.h * 0.5 + 8.0, 22.0, text);
    }
}

fn draw_menu(vp: &Viewport) {
    vp.centered("DISCOGSNAKE", vp.height * 0.3, 56.0, SNAKE_HEAD);
    vp.centered("Eat your way through an album cover", vp.height * 0.3 + 40.0, 20.0, MUTED);
}

fn draw_search(screen: &SearchScreen, textures: &mut TextureCache, vp: &Viewport) {
    vp.centered("Search for an album", 60.0, 32.0, ACCENT);

    let field = Rect::new(40.0, 90.0, vp.width - 80.0, 44.0);
    vp.fill(field, BUTTON);
    let s = vp.to_screen(field);
    draw_rectangle_lines(s.x, s.y, s.w, s.h, 2.0, MUTED);
    let caret = if (get_time() * 2.0) as i64 % 2 == 0 { "_" } else { "" };
    vp.text(&format!("{}{caret}", screen.query), field.x + 10.0, field.y + 30.0, 24.0, WHITE);

    let status_y = ROWS_TOP - 12.0;
    match &screen.status {
        SearchStatus::Idle => vp.centered("Press Enter to search", status_y, 18.0, MUTED),
        SearchStatus::InFlight => vp.centered("Searching for album... hang on", status_y, 18.0, ACCENT),
        SearchStatus::NoResults => vp.centered("No albums found", status_y, 18.0, FOOD),
        SearchStatus::EmptyQuery => vp.centered("Please enter a search term", status_y, 18.0, FOOD),
        SearchStatus::Failed(why) => vp.centered(&format!("Search failed: {why}"), status_y, 18.0, FOOD),
        SearchStatus::Results(albums) => {
            let hover = vp.to_logical(mouse_position());
            for (i, album) in albums.iter().enumerate() {
                let row = result_row(i, vp);
                vp.fill(row, if row.contains(hover) { Color::new(0.28, 0.3, 0.4, 1.0) } else { BUTTON });
                let thumb = Rect::new(row.x + 4.0, row.y + 4.0, THUMB_SIZE as f32, THUMB_SIZE as f32);
                vp.texture(textures.thumb(album), thumb, WHITE);
                let tx = thumb.x + thumb.w + 12.0;
                vp.text(&album.title, tx, row.y + 24.0, 20.0, WHITE);
                vp.text(&album.artist, tx, row.y + 46.0, 16.0, MUTED);
            }
        }
    }
}

fn draw_cover(textures: &TextureCache, vp: &Viewport, tint: Color) {
    for (cell, tex) in &textures.tiles {
        let size = vec2(tex.width(), tex.height());
        vp.texture(tex, Rect::new(cell.col as f32 * size.x, cell.row as f32 * size.y, size.x, size.y), tint);
    }
}

fn draw_game(session: &Session, textures: &TextureCache, vp: &Viewport) {
    let Some(game) = session.game() else { return };
    if let Some((tw, th)) = session.tiles().map(|t| t.tile_size()) {
        let (tw, th) = (tw as f32, th as f32);
        for cell in game.revealed().iter() {
            if let Some(tex) = textures.tiles.get(&cell) {
                let r = Rect::new(cell.col as f32 * tw, cell.row as f32 * th, tex.width(), tex.height());
                vp.texture(tex, r, WHITE);
            }
        }
    }
    draw_snake(game, session.board().grid_size() as f32, vp);
}

fn draw_snake(game: &Game, cell: f32, vp: &Viewport) {
    let sim = game.simulator();
    if let Some(food) = sim.food() {
        vp.fill(Rect::new(food.x as f32 + 4.0, food.y as f32 + 4.0, cell - 8.0, cell - 8.0), FOOD);
    }
    for (i, p) in sim.snake().body().iter().enumerate() {
        let color = if i == 0 { SNAKE_HEAD } else { SNAKE_BODY };
        vp.fill(Rect::new(p.x as f32 + 1.0, p.y as f32 + 1.0, cell - 2.0, cell - 2.0), color);
    }
}

fn draw_hud(session: &Session, vp: &Viewport) {
    let Some(game) = session.game() else { return };
    vp.text(&format!("Score: {}", game.score()), 8.0, 22.0, 22.0, WHITE);
    let progress = format!("{}/{}  speed {:.0}", game.revealed().len(), game.revealed().total(), session.speed());
    let m = measure_text(&progress, None, 18, 1.0);
    vp.text(&progress, vp.width - m.width - 8.0, 22.0, 18.0, MUTED);

    let mut y = vp.height - 46.0;
    if let Some(album) = session.album() {
        let suffix = if session.cover_is_placeholder() { " (no cover)" } else { "" };
        vp.text(&format!("{} by {}{suffix}", album.title, album.artist), 8.0, y, 16.0, MUTED);
        y += 20.0;
    }
    if let Some(now) = session.now_playing() {
        vp.text(&format!("Now playing: {} by {}", now.song, now.artist), 8.0, y, 16.0, ACCENT);
    }
}

fn overlay(vp: &Viewport, title: &str, hint: &str) {
    vp.fill(Rect::new(0.0, vp.height * 0.38, vp.width, 90.0), DIM);
    vp.centered(title, vp.height * 0.38 + 40.0, 32.0, ACCENT);
    vp.centered(hint, vp.height * 0.38 + 72.0, 20.0, WHITE);
}

fn draw_result(session: &Session, title: &str, vp: &Viewport) {
    vp.centered(title, vp.height * 0.25, 48.0, ACCENT);
    if let Some(game) = session.game() {
        vp.centered(&format!("Score: {}", game.score()), vp.height * 0.25 + 44.0, 26.0, WHITE);
    }
    if let Some(album) = session.album() {
        vp.centered(&format!("{} by {}", album.title, album.artist), vp.height * 0.25 + 76.0, 18.0, MUTED);
    }
}
