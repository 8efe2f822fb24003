//! Game configuration, read from `discogsnake.json` next to the binary.
//!
//! Every field has a default, so a partial file (or none at all) works.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::grid::Board;

pub const CONFIG_PATH: &str = "discogsnake.json";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Discogs,
    Spotify,
    /// Canned results and procedural covers, no network.
    Demo,
}

impl Backend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discogs" => Some(Backend::Discogs),
            "spotify" => Some(Backend::Spotify),
            "demo" => Some(Backend::Demo),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    /// Movement cell size in pixels.
    pub grid_size: i32,
    /// Album tile size in pixels.
    pub album_grid_size: i32,
    pub initial_snake_len: usize,
    /// Steps per second at the start of a game.
    pub base_speed: f64,
    pub speed_increment: f64,
    pub pieces_per_speedup: u32,
    pub points_per_piece: u32,
    pub food_random_attempts: u32,
    pub search_attempts: u32,
    pub search_retry_delay_ms: u64,
    pub max_results: usize,
    pub search_timeout_ms: u64,
    pub cover_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub quit_pause_timeout_ms: u64,
    pub now_playing_refresh_secs: f64,
    pub backend: Backend,
    pub backend_url: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            grid_size: 30,
            album_grid_size: 60,
            initial_snake_len: 5,
            base_speed: 7.0,
            speed_increment: 1.0,
            pieces_per_speedup: 5,
            points_per_piece: 10,
            food_random_attempts: 100,
            search_attempts: 2,
            search_retry_delay_ms: 2000,
            max_results: 5,
            search_timeout_ms: 30_000,
            cover_timeout_ms: 15_000,
            http_timeout_ms: 10_000,
            quit_pause_timeout_ms: 500,
            now_playing_refresh_secs: 15.0,
            backend: Backend::Discogs,
            backend_url: "https://spotisnake2-0.onrender.com".to_string(),
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: GameConfig =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Loads `path` if present, applies environment overrides and validates.
    /// Anything unusable falls back to defaults; this never fails.
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = if path.exists() {
            match Self::load(path) {
                Ok(c) => {
                    info!(path = %path.display(), "loaded config");
                    c
                }
                Err(err) => {
                    warn!("{err:#}; using defaults");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env();

        if let Err(err) = config.validate() {
            error!("invalid config: {err:#}; using defaults");
            let mut fallback = Self::default();
            fallback.apply_env();
            return fallback;
        }
        config
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DISCOGSNAKE_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(name) = std::env::var("DISCOGSNAKE_BACKEND") {
            match Backend::parse(&name) {
                Some(b) => self.backend = b,
                None => warn!(%name, "unknown DISCOGSNAKE_BACKEND ignored"),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(anyhow!("width and height must be positive"));
        }
        if self.grid_size <= 0 || self.album_grid_size <= 0 {
            return Err(anyhow!("grid_size and album_grid_size must be positive"));
        }
        if self.width % self.grid_size != 0 || self.height % self.grid_size != 0 {
            return Err(anyhow!("width and height must be multiples of grid_size"));
        }
        // Every album tile must hold at least one cell food can land on.
        if self.album_grid_size % self.grid_size != 0 {
            return Err(anyhow!(
                "album_grid_size {} must be a multiple of grid_size {}",
                self.album_grid_size,
                self.grid_size
            ));
        }
        if !(self.base_speed > 0.0) {
            return Err(anyhow!("base_speed must be positive"));
        }
        if !(self.speed_increment >= 0.0) {
            return Err(anyhow!("speed_increment must be non-negative"));
        }
        if self.pieces_per_speedup == 0 {
            return Err(anyhow!("pieces_per_speedup must be positive"));
        }
        if self.search_attempts == 0 {
            return Err(anyhow!("search_attempts must be at least 1"));
        }
        if self.initial_snake_len == 0 {
            return Err(anyhow!("initial_snake_len must be at least 1"));
        }
        let cells_left_of_centre = (self.width / 2) / self.grid_size + 1;
        if self.initial_snake_len as i32 > cells_left_of_centre {
            return Err(anyhow!(
                "initial_snake_len {} does not fit on a {}-pixel board",
                self.initial_snake_len,
                self.width
            ));
        }
        Ok(())
    }

    /// Tile grid dimensions of the album mosaic.
    pub fn tile_grid(&self) -> (i32, i32) {
        Board::new(self.width, self.height, self.grid_size).cells_across(self.album_grid_size)
    }
}
