//! The session state machine: menu → search → loading → play → result.
//!
//! A `Session` owns everything about the current run. Collaborator calls are
//! handed to a [`Spawner`] and answer over a channel; each answer is tagged
//! with the epoch that was current when it was requested, and anything from
//! an older epoch is dropped on arrival.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bitmap::Bitmap;
use crate::config::GameConfig;
use crate::cover;
use crate::dispatch::{Envelope, Reply, Spawner};
use crate::error::AlbumProviderError;
use crate::grid::{Board, Direction};
use crate::provider::{self, Album, AlbumProvider, NowPlaying, Playback};
use crate::reveal::RevealTracker;
use crate::snake::{Simulator, Snake, StepOutcome};
use crate::tiler::{self, TileSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Click / Enter / Space on a confirm-style screen.
    Confirm,
    Turn(Direction),
    Text(char),
    Backspace,
    Submit,
    Select(usize),
    /// Escape or a "back to menu" button.
    Back,
    Retry,
    NewGame,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchStatus {
    Idle,
    InFlight,
    Results(Vec<Album>),
    NoResults,
    Failed(String),
    EmptyQuery,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchScreen {
    pub query: String,
    pub status: SearchStatus,
}

impl Default for SearchScreen {
    fn default() -> Self {
        Self { query: String::new(), status: SearchStatus::Idle }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Lost,
    Won,
}

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Menu,
    Searching(SearchScreen),
    Loading,
    ClickToStart,
    Playing,
    ClickToContinue(Outcome),
    GameOver,
    Win,
    Terminated,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Menu => "menu",
            State::Searching(_) => "searching",
            State::Loading => "loading",
            State::ClickToStart => "click-to-start",
            State::Playing => "playing",
            State::ClickToContinue(_) => "click-to-continue",
            State::GameOver => "game-over",
            State::Win => "win",
            State::Terminated => "terminated",
        }
    }
}

enum Completion {
    Search(Result<Vec<Album>, AlbumProviderError>),
    Cover(Result<Bitmap, AlbumProviderError>),
    NowPlaying(Result<Option<NowPlaying>, AlbumProviderError>),
}

/// Steps per second after `pieces` pieces have been eaten.
pub fn speed_for(config: &GameConfig, pieces: u32) -> f64 {
    config.base_speed + (pieces / config.pieces_per_speedup.max(1)) as f64 * config.speed_increment
}

/// One playthrough: snake, food, revealed tiles and score.
pub struct Game {
    sim: Simulator,
    reveal: RevealTracker,
    score: u32,
    pieces_eaten: u32,
    last_step_at: f64,
}

impl Game {
    pub fn simulator(&self) -> &Simulator { &self.sim }
    pub fn revealed(&self) -> &RevealTracker { &self.reveal }
    pub fn score(&self) -> u32 { self.score }
    pub fn pieces_eaten(&self) -> u32 { self.pieces_eaten }
}

pub struct Session {
    config: GameConfig,
    board: Board,
    provider: Arc<dyn AlbumProvider>,
    playback: Arc<dyn Playback>,
    spawner: Box<dyn Spawner>,
    tx: Sender<Envelope<Completion>>,
    rx: Receiver<Envelope<Completion>>,
    epoch: u64,
    state: State,
    album: Option<Album>,
    tiles: Option<TileSet>,
    tiles_version: u64,
    cover_is_placeholder: bool,
    cover_pending: bool,
    deadline: Option<f64>,
    game: Option<Game>,
    now: f64,
    now_playing: Option<NowPlaying>,
    next_refresh_at: Option<f64>,
    seed: u64,
    games_started: u64,
}

impl Session {
    pub fn new(
        config: GameConfig,
        provider: Arc<dyn AlbumProvider>,
        playback: Arc<dyn Playback>,
        spawner: Box<dyn Spawner>,
        seed: u64,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let board = Board::new(config.width, config.height, config.grid_size);
        Self {
            config,
            board,
            provider,
            playback,
            spawner,
            tx,
            rx,
            epoch: 0,
            state: State::Menu,
            album: None,
            tiles: None,
            tiles_version: 0,
            cover_is_placeholder: false,
            cover_pending: false,
            deadline: None,
            game: None,
            now: 0.0,
            now_playing: None,
            next_refresh_at: None,
            seed,
            games_started: 0,
        }
    }

    pub fn state(&self) -> &State { &self.state }
    pub fn config(&self) -> &GameConfig { &self.config }
    pub fn board(&self) -> &Board { &self.board }
    pub fn epoch(&self) -> u64 { self.epoch }
    pub fn album(&self) -> Option<&Album> { self.album.as_ref() }
    pub fn tiles(&self) -> Option<&TileSet> { self.tiles.as_ref() }
    /// Changes whenever a new tile set is installed.
    pub fn tiles_version(&self) -> u64 { self.tiles_version }
    pub fn cover_is_placeholder(&self) -> bool { self.cover_is_placeholder }
    pub fn game(&self) -> Option<&Game> { self.game.as_ref() }
    pub fn now_playing(&self) -> Option<&NowPlaying> { self.now_playing.as_ref() }
    pub fn is_terminated(&self) -> bool { self.state == State::Terminated }

    pub fn speed(&self) -> f64 {
        speed_for(&self.config, self.game.as_ref().map_or(0, |g| g.pieces_eaten))
    }

    pub fn handle(&mut self, input: Input) {
        if self.is_terminated() {
            return;
        }
        if input == Input::Quit {
            self.quit();
            return;
        }

        match &self.state {
            State::Menu => {
                if input == Input::Confirm {
                    self.enter_search();
                }
            }
            State::Searching(_) => self.handle_search(input),
            State::Loading => {
                if input == Input::Back {
                    self.enter_menu();
                }
            }
            State::ClickToStart => match input {
                Input::Confirm => self.start_playing(),
                Input::Turn(dir) => {
                    self.start_playing();
                    self.turn(dir);
                }
                Input::Back => self.enter_menu(),
                _ => {}
            },
            State::Playing => match input {
                Input::Turn(dir) => self.turn(dir),
                Input::Back => self.enter_menu(),
                _ => {}
            },
            State::ClickToContinue(outcome) => {
                let next = match outcome {
                    Outcome::Lost => State::GameOver,
                    Outcome::Won => State::Win,
                };
                if input == Input::Confirm {
                    self.transition(next);
                }
            }
            State::GameOver | State::Win => match input {
                Input::Retry => self.retry(),
                Input::NewGame => self.enter_search(),
                Input::Back => self.enter_menu(),
                _ => {}
            },
            State::Terminated => {}
        }
    }

    /// Advances to wall-clock time `now` (seconds): collects finished
    /// collaborator calls, enforces deadlines and steps the snake when due.
    pub fn update(&mut self, now: f64) {
        self.now = now;
        if self.is_terminated() {
            return;
        }

        self.drain_completions();
        self.check_deadline();

        match self.state {
            State::Loading if !self.cover_pending && self.tiles.is_some() => self.ready_to_start(),
            State::Playing => {
                self.tick();
                self.refresh_now_playing();
            }
            _ => {}
        }
    }

    fn transition(&mut self, next: State) {
        info!(from = self.state.name(), to = next.name(), epoch = self.epoch, "state change");
        self.state = next;
    }

    /// Invalidates everything in flight.
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.deadline = None;
        self.cover_pending = false;
    }

    fn reply(&self) -> Reply<Completion> {
        Reply::new(self.epoch, self.tx.clone())
    }

    fn clear_album(&mut self) {
        self.album = None;
        self.tiles = None;
        self.game = None;
        self.now_playing = None;
        self.next_refresh_at = None;
        self.cover_is_placeholder = false;
    }

    fn enter_menu(&mut self) {
        self.bump_epoch();
        self.clear_album();
        self.transition(State::Menu);
    }

    fn enter_search(&mut self) {
        self.bump_epoch();
        self.clear_album();
        self.transition(State::Searching(SearchScreen::default()));
    }

    fn handle_search(&mut self, input: Input) {
        let State::Searching(screen) = &mut self.state else { return };
        match input {
            Input::Text(c) if !c.is_control() => {
                screen.query.push(c);
                if screen.status == SearchStatus::EmptyQuery {
                    screen.status = SearchStatus::Idle;
                }
            }
            Input::Backspace => {
                screen.query.pop();
                if screen.query.is_empty() && screen.status != SearchStatus::InFlight {
                    screen.status = SearchStatus::Idle;
                }
            }
            Input::Submit => {
                let query = screen.query.clone();
                self.submit_search(query);
            }
            Input::Select(index) => {
                let picked = match &screen.status {
                    SearchStatus::Results(albums) => albums.get(index).cloned(),
                    _ => None,
                };
                if let Some(album) = picked {
                    self.choose_album(album);
                }
            }
            Input::Back => self.enter_menu(),
            _ => {}
        }
    }

    fn submit_search(&mut self, query: String) {
        self.bump_epoch();
        let query = query.trim().to_string();
        let State::Searching(screen) = &mut self.state else { return };

        if query.is_empty() {
            screen.status = SearchStatus::EmptyQuery;
            return;
        }
        screen.status = SearchStatus::InFlight;
        info!(%query, "searching");

        self.deadline = Some(self.now + self.config.search_timeout_ms as f64 / 1000.0);
        let provider = self.provider.clone();
        let attempts = self.config.search_attempts;
        let delay = Duration::from_millis(self.config.search_retry_delay_ms);
        let reply = self.reply();
        self.spawner.spawn(
            "search",
            Box::new(move || {
                let result = provider::search_with_retry(provider.as_ref(), &query, attempts, delay);
                reply.send(Completion::Search(result));
            }),
        );
    }

    fn on_search(&mut self, result: Result<Vec<Album>, AlbumProviderError>) {
        let State::Searching(screen) = &mut self.state else { return };
        if screen.status != SearchStatus::InFlight {
            return;
        }
        self.deadline = None;
        screen.status = match result {
            Ok(albums) => {
                let albums = provider::dedupe(albums, self.config.max_results);
                if albums.is_empty() { SearchStatus::NoResults } else { SearchStatus::Results(albums) }
            }
            Err(AlbumProviderError::NoResults) => SearchStatus::NoResults,
            Err(AlbumProviderError::InvalidInput) => SearchStatus::EmptyQuery,
            Err(err) => {
                warn!(%err, "search failed");
                SearchStatus::Failed(err.to_string())
            }
        };
    }

    fn choose_album(&mut self, album: Album) {
        self.bump_epoch();
        self.clear_album();
        info!(title = %album.title, artist = %album.artist, id = %album.id, "album chosen");
        self.album = Some(album.clone());
        self.transition(State::Loading);

        let Some(url) = album.cover_url.clone() else {
            self.install_cover(Err(AlbumProviderError::Network("album has no cover url".into())));
            return;
        };

        self.cover_pending = true;
        self.deadline = Some(self.now + self.config.cover_timeout_ms as f64 / 1000.0);
        let provider = self.provider.clone();
        let (w, h) = (self.config.width as u32, self.config.height as u32);
        let reply = self.reply();
        self.spawner.spawn(
            "cover",
            Box::new(move || reply.send(Completion::Cover(provider.fetch_cover(&url, w, h)))),
        );
    }

    fn install_cover(&mut self, result: Result<Bitmap, AlbumProviderError>) {
        let (w, h) = (self.config.width as u32, self.config.height as u32);
        let result = result.and_then(|bmp| {
            if (bmp.width(), bmp.height()) == (w, h) {
                Ok(bmp)
            } else {
                Err(AlbumProviderError::Decode(format!("cover is {}x{}, wanted {w}x{h}", bmp.width(), bmp.height())))
            }
        });

        let bitmap = match result {
            Ok(bmp) => {
                self.cover_is_placeholder = false;
                bmp
            }
            Err(err) => {
                warn!(%err, "cover unavailable, using placeholder");
                self.cover_is_placeholder = true;
                let key = self.album.as_ref().map_or("", |a| a.id.as_str());
                cover::placeholder(w, h, cover::seed_for(key))
            }
        };

        let size = self.config.album_grid_size as u32;
        self.tiles = Some(tiler::tile(&bitmap, size, size));
        self.tiles_version += 1;
        self.cover_pending = false;
        self.deadline = None;
        self.ready_to_start();
    }

    fn ready_to_start(&mut self) {
        self.game = Some(self.new_game());
        self.transition(State::ClickToStart);
    }

    fn new_game(&mut self) -> Game {
        self.games_started += 1;
        let (cols, rows) = match &self.tiles {
            Some(t) => (t.cols() as i32, t.rows() as i32),
            None => self.config.tile_grid(),
        };
        let snake = Snake::new(
            self.board.center(),
            self.config.initial_snake_len,
            Direction::Right,
            self.board.grid_size(),
        );
        let mut sim = Simulator::new(
            self.board,
            self.config.album_grid_size,
            snake,
            self.seed.wrapping_add(self.games_started),
            self.config.food_random_attempts,
        );
        let reveal = RevealTracker::new(cols, rows);
        sim.place_food(&reveal);
        Game { sim, reveal, score: 0, pieces_eaten: 0, last_step_at: self.now }
    }

    fn start_playing(&mut self) {
        let Some(game) = self.game.as_mut() else { return };
        game.last_step_at = self.now;
        self.transition(State::Playing);

        if let Some(album) = self.album.clone() {
            let playback = self.playback.clone();
            let reply = self.reply();
            self.spawner.spawn(
                "play",
                Box::new(move || reply.send(Completion::NowPlaying(playback.play_album(&album).map(Some)))),
            );
        }
        if self.config.now_playing_refresh_secs > 0.0 {
            self.next_refresh_at = Some(self.now + self.config.now_playing_refresh_secs);
        }
    }

    fn turn(&mut self, dir: Direction) {
        if let Some(game) = self.game.as_mut() {
            if !game.sim.set_direction(dir) {
                debug!(?dir, "turn rejected");
            }
        }
    }

    fn tick(&mut self) {
        let interval = 1.0 / self.speed();
        let album_grid = self.config.album_grid_size;
        let points = self.config.points_per_piece;
        let Some(game) = self.game.as_mut() else { return };
        if self.now - game.last_step_at < interval {
            return;
        }
        game.last_step_at = self.now;

        let finished = match game.sim.step() {
            StepOutcome::Collided => {
                info!(score = game.score, revealed = game.reveal.len(), "snake crashed");
                Some(Outcome::Lost)
            }
            StepOutcome::Continue => {
                if game.sim.food().is_none() {
                    game.sim.place_food(&game.reveal);
                }
                None
            }
            StepOutcome::AteFoodAt(pos) => {
                let cell = self.board.to_cell(pos, album_grid);
                game.reveal.reveal(cell);
                game.pieces_eaten += 1;
                game.score += points;
                debug!(?cell, score = game.score, revealed = game.reveal.len(), "piece eaten");
                if game.reveal.is_complete() {
                    info!(score = game.score, "album fully revealed");
                    Some(Outcome::Won)
                } else {
                    if game.sim.place_food(&game.reveal).is_none() {
                        debug!("no free cell for food yet");
                    }
                    None
                }
            }
        };

        if let Some(outcome) = finished {
            self.next_refresh_at = None;
            self.transition(State::ClickToContinue(outcome));
        }
    }

    fn refresh_now_playing(&mut self) {
        let Some(at) = self.next_refresh_at else { return };
        if self.now < at {
            return;
        }
        self.next_refresh_at = Some(self.now + self.config.now_playing_refresh_secs);
        let playback = self.playback.clone();
        let reply = self.reply();
        self.spawner.spawn(
            "now-playing",
            Box::new(move || reply.send(Completion::NowPlaying(playback.currently_playing()))),
        );
    }

    fn on_now_playing(&mut self, result: Result<Option<NowPlaying>, AlbumProviderError>) {
        match result {
            Ok(Some(now)) => self.now_playing = Some(now),
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "playback unavailable");
                if self.now_playing.is_none() {
                    self.now_playing = self
                        .album
                        .as_ref()
                        .map(|a| NowPlaying { song: a.title.clone(), artist: a.artist.clone() });
                }
            }
        }
    }

    fn retry(&mut self) {
        self.bump_epoch();
        self.game = None;
        self.now_playing = None;
        self.next_refresh_at = None;
        match (self.tiles.is_some(), self.album.clone()) {
            (true, _) => self.transition(State::Loading),
            (false, Some(album)) => self.choose_album(album),
            (false, None) => self.enter_search(),
        }
    }

    fn drain_completions(&mut self) {
        while let Ok(envelope) = self.rx.try_recv() {
            if envelope.epoch != self.epoch {
                debug!(epoch = envelope.epoch, current = self.epoch, "discarding stale completion");
                continue;
            }
            match envelope.payload {
                Completion::Search(result) => self.on_search(result),
                Completion::Cover(result) => {
                    if self.state == State::Loading && self.cover_pending {
                        self.install_cover(result);
                    }
                }
                Completion::NowPlaying(result) => self.on_now_playing(result),
            }
        }
    }

    fn check_deadline(&mut self) {
        let Some(deadline) = self.deadline else { return };
        if self.now < deadline {
            return;
        }
        let cover_timed_out = self.state == State::Loading && self.cover_pending;
        // Whatever answers later belongs to an older epoch.
        self.bump_epoch();

        if let State::Searching(screen) = &mut self.state {
            if screen.status == SearchStatus::InFlight {
                warn!("search timed out");
                screen.status = SearchStatus::Failed("search timed out".to_string());
            }
        } else if cover_timed_out {
            self.install_cover(Err(AlbumProviderError::Network("cover fetch timed out".into())));
        }
    }

    fn quit(&mut self) {
        info!("quitting");
        self.bump_epoch();

        let (tx, rx) = mpsc::channel();
        let playback = self.playback.clone();
        self.spawner.spawn(
            "pause",
            Box::new(move || {
                let _ = tx.send(playback.pause());
            }),
        );
        match wait_bounded(&rx, Duration::from_millis(self.config.quit_pause_timeout_ms)) {
            Some(Ok(())) => debug!("playback paused"),
            Some(Err(err)) => warn!(%err, "could not pause playback"),
            None => warn!("pause did not answer in time"),
        }

        self.clear_album();
        self.transition(State::Terminated);
    }
}

fn wait_bounded<T>(rx: &Receiver<T>, timeout: Duration) -> Option<T> {
    if let Ok(v) = rx.try_recv() {
        return Some(v);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        rx.recv_timeout(timeout).ok()
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = timeout;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_steps_up_every_five_pieces() {
        let c = GameConfig::default();
        assert_eq!(speed_for(&c, 0), 7.0);
        assert_eq!(speed_for(&c, 4), 7.0);
        assert_eq!(speed_for(&c, 5), 8.0);
        assert_eq!(speed_for(&c, 14), 9.0);
        assert_eq!(speed_for(&c, 100), 27.0);
    }

    #[test]
    fn state_names_are_distinct() {
        let states = [
            State::Menu,
            State::Searching(SearchScreen::default()),
            State::Loading,
            State::ClickToStart,
            State::Playing,
            State::ClickToContinue(Outcome::Lost),
            State::GameOver,
            State::Win,
            State::Terminated,
        ];
        let mut names: Vec<&str> = states.iter().map(State::name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), states.len());
    }
}
