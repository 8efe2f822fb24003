//! The album collaborators: search, cover fetch and (optionally) playback.
//!
//! Everything here may block, so the session only calls it through a
//! [`Spawner`](crate::dispatch::Spawner).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bitmap::Bitmap;
use crate::config::{Backend, GameConfig};
use crate::error::AlbumProviderError;

pub mod demo;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;
pub mod wire;

pub use demo::{DemoProvider, NoPlayback};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub title: String,
    pub artist: String,
    /// Discogs release id or Spotify album uri.
    pub id: String,
    pub cover_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub song: String,
    pub artist: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

pub trait AlbumProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Album>, AlbumProviderError>;

    fn fetch_cover(&self, url: &str, target_w: u32, target_h: u32) -> Result<Bitmap, AlbumProviderError>;
}

/// Cosmetic "now playing" control. Failures never affect the game.
pub trait Playback: Send + Sync {
    fn play_album(&self, album: &Album) -> Result<NowPlaying, AlbumProviderError>;

    fn pause(&self) -> Result<(), AlbumProviderError>;

    fn devices(&self) -> Result<Vec<Device>, AlbumProviderError>;

    fn currently_playing(&self) -> Result<Option<NowPlaying>, AlbumProviderError>;
}

/// Searches up to `attempts` times, retrying on network failure or an empty
/// answer (a cold backend often returns nothing on the first call).
pub fn search_with_retry(
    provider: &dyn AlbumProvider,
    query: &str,
    attempts: u32,
    delay: Duration,
) -> Result<Vec<Album>, AlbumProviderError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AlbumProviderError::InvalidInput);
    }

    let attempts = attempts.max(1);
    let mut last = Err(AlbumProviderError::NoResults);
    for attempt in 1..=attempts {
        debug!(%query, attempt, attempts, "searching");
        match provider.search(query) {
            Ok(albums) if !albums.is_empty() => return Ok(albums),
            Ok(_) => last = Err(AlbumProviderError::NoResults),
            Err(AlbumProviderError::InvalidInput) => return Err(AlbumProviderError::InvalidInput),
            Err(err) => {
                warn!(%query, attempt, %err, "search attempt failed");
                last = Err(err);
            }
        }
        if attempt < attempts && !delay.is_zero() {
            pause_between_attempts(delay);
        }
    }
    last
}

#[cfg(not(target_arch = "wasm32"))]
fn pause_between_attempts(delay: Duration) {
    std::thread::sleep(delay);
}

// No blocking sleep in the browser; retry immediately.
#[cfg(target_arch = "wasm32")]
fn pause_between_attempts(_delay: Duration) {}

/// Drops repeated artist/title pairs and keeps the first `limit` albums.
pub fn dedupe(albums: Vec<Album>, limit: usize) -> Vec<Album> {
    let mut seen = HashSet::new();
    albums
        .into_iter()
        .filter(|a| seen.insert((a.artist.to_lowercase(), a.title.to_lowercase())))
        .take(limit)
        .collect()
}

/// Builds the collaborators for the configured backend.
pub fn connect(config: &GameConfig) -> (Arc<dyn AlbumProvider>, Arc<dyn Playback>) {
    match config.backend {
        Backend::Demo => (Arc::new(DemoProvider), Arc::new(NoPlayback)),
        #[cfg(not(target_arch = "wasm32"))]
        Backend::Discogs => {
            let client = http::HttpBackend::new(&config.backend_url, http::Flavor::Discogs, config.http_timeout_ms);
            (Arc::new(client), Arc::new(NoPlayback))
        }
        #[cfg(not(target_arch = "wasm32"))]
        Backend::Spotify => {
            let client = Arc::new(http::HttpBackend::new(
                &config.backend_url,
                http::Flavor::Spotify,
                config.http_timeout_ms,
            ));
            (client.clone(), client)
        }
        #[cfg(target_arch = "wasm32")]
        other => {
            warn!(backend = ?other, "no HTTP client in the browser build; using demo backend");
            (Arc::new(DemoProvider), Arc::new(NoPlayback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        answers: Mutex<Vec<Result<Vec<Album>, AlbumProviderError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut answers: Vec<Result<Vec<Album>, AlbumProviderError>>) -> Self {
            answers.reverse();
            Self { answers: Mutex::new(answers), calls: Mutex::new(0) }
        }
        fn calls(&self) -> u32 { *self.calls.lock().unwrap() }
    }

    impl AlbumProvider for Scripted {
        fn search(&self, _query: &str) -> Result<Vec<Album>, AlbumProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop().unwrap_or(Ok(vec![]))
        }
        fn fetch_cover(&self, _url: &str, _w: u32, _h: u32) -> Result<Bitmap, AlbumProviderError> {
            Err(AlbumProviderError::Network("unused".into()))
        }
    }

    fn album(title: &str, artist: &str) -> Album {
        Album { title: title.into(), artist: artist.into(), id: title.into(), cover_url: None }
    }

    #[test]
    fn empty_query_never_reaches_the_provider() {
        let p = Scripted::new(vec![]);
        assert_eq!(search_with_retry(&p, "   ", 2, Duration::ZERO), Err(AlbumProviderError::InvalidInput));
        assert_eq!(p.calls(), 0);
    }

    #[test]
    fn empty_twice_is_no_results() {
        let p = Scripted::new(vec![Ok(vec![]), Ok(vec![])]);
        assert_eq!(
            search_with_retry(&p, "xyz_no_such_album", 2, Duration::ZERO),
            Err(AlbumProviderError::NoResults)
        );
        assert_eq!(p.calls(), 2);
    }

    #[test]
    fn network_error_then_success() {
        let p = Scripted::new(vec![
            Err(AlbumProviderError::Network("cold start".into())),
            Ok(vec![album("Kind of Blue", "Miles Davis")]),
        ]);
        let found = search_with_retry(&p, "kind of blue", 2, Duration::ZERO).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(p.calls(), 2);
    }

    #[test]
    fn persistent_network_error_is_reported() {
        let p = Scripted::new(vec![
            Err(AlbumProviderError::Network("down".into())),
            Err(AlbumProviderError::Network("still down".into())),
        ]);
        assert_eq!(
            search_with_retry(&p, "anything", 2, Duration::ZERO),
            Err(AlbumProviderError::Network("still down".into()))
        );
    }

    #[test]
    fn dedupe_keeps_first_of_each_pair() {
        let albums = vec![
            album("Blue", "Joni Mitchell"),
            album("blue", "joni mitchell"),
            album("Court and Spark", "Joni Mitchell"),
            album("Hejira", "Joni Mitchell"),
        ];
        let out = dedupe(albums, 2);
        assert_eq!(out.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(), vec!["Blue", "Court and Spark"]);
    }
}
