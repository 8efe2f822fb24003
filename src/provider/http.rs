//! Blocking HTTP client for the DiscogSnake proxy backends.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::wire::{self, CoverRequest, CoverResponse, PlayRequest};
use super::{Album, AlbumProvider, Device, NowPlaying, Playback};
use crate::bitmap::Bitmap;
use crate::cover;
use crate::error::AlbumProviderError;

/// Which response shapes the backend speaks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flavor {
    Discogs,
    Spotify,
}

pub struct HttpBackend {
    base: String,
    flavor: Flavor,
    agent: ureq::Agent,
}

fn network(err: ureq::Error) -> AlbumProviderError {
    match err {
        ureq::Error::Status(code, _) => AlbumProviderError::Network(format!("HTTP {code}")),
        ureq::Error::Transport(t) => AlbumProviderError::Network(t.to_string()),
    }
}

fn malformed(err: std::io::Error) -> AlbumProviderError {
    AlbumProviderError::Network(format!("malformed response: {err}"))
}

impl HttpBackend {
    pub fn new(base_url: &str, flavor: Flavor, timeout_ms: u64) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(Duration::from_millis(timeout_ms)).build();
        Self { base: base_url.trim_end_matches('/').to_string(), flavor, agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, AlbumProviderError> {
        let mut req = self.agent.get(&self.url(path)).set("Accept", "application/json");
        for (k, v) in query {
            req = req.query(k, v);
        }
        req.call().map_err(network)?.into_json().map_err(malformed)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, AlbumProviderError> {
        self.agent
            .post(&self.url(path))
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(network)?
            .into_json()
            .map_err(malformed)
    }

    fn play_uri(&self, uri: &str, device_id: Option<&str>, position_ms: u64) -> Result<(), AlbumProviderError> {
        let _: serde_json::Value = self.post_json("play", &PlayRequest { uri, device_id, position_ms })?;
        Ok(())
    }
}

impl AlbumProvider for HttpBackend {
    fn search(&self, query: &str) -> Result<Vec<Album>, AlbumProviderError> {
        if query.trim().is_empty() {
            return Err(AlbumProviderError::InvalidInput);
        }
        let albums = match self.flavor {
            Flavor::Discogs => wire::albums_from_discogs(self.get_json("search", &[("q", query)])?),
            Flavor::Spotify => wire::albums_from_spotify(self.get_json("search", &[("q", query)])?),
        };
        debug!(%query, found = albums.len(), "search answered");
        Ok(albums)
    }

    fn fetch_cover(&self, url: &str, target_w: u32, target_h: u32) -> Result<Bitmap, AlbumProviderError> {
        let req = CoverRequest { image_url: url, target_width: target_w, target_height: target_h };
        let resp: CoverResponse = self.post_json("download_album_cover", &req)?;
        let bytes = wire::cover_bytes(resp)?;
        cover::decode(&bytes, target_w, target_h)
    }
}

impl Playback for HttpBackend {
    fn play_album(&self, album: &Album) -> Result<NowPlaying, AlbumProviderError> {
        let page: wire::SpotifyPage<wire::SpotifyTrack> = self.get_json("album_tracks", &[("album_id", album.id.as_str())])?;
        if page.items.is_empty() {
            return Err(AlbumProviderError::NoResults);
        }

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(nanos ^ cover::seed_for(&album.id));
        let mut items = page.items;
        let pick = rng.gen_range(0..items.len());
        let track = items.swap_remove(pick);
        let position = wire::start_position(&track, &mut rng);
        debug!(uri = %track.uri, position, "starting track");

        if let Err(err) = self.play_uri(&track.uri, None, position) {
            // No explicit device; fall back to whichever one Spotify knows about.
            warn!(%err, "play without device failed, looking for a device");
            let devices = self.devices()?;
            let device = wire::pick_device(&devices)
                .ok_or_else(|| AlbumProviderError::Network("no playback device available".into()))?;
            self.play_uri(&track.uri, Some(&device.id), position)?;
        }

        let now = wire::now_playing_from(track);
        info!(song = %now.song, artist = %now.artist, "playing");
        Ok(now)
    }

    fn pause(&self) -> Result<(), AlbumProviderError> {
        let _: serde_json::Value = self.post_json("pause", &serde_json::json!({}))?;
        Ok(())
    }

    fn devices(&self) -> Result<Vec<Device>, AlbumProviderError> {
        Ok(wire::devices_from(self.get_json("devices", &[])?))
    }

    fn currently_playing(&self) -> Result<Option<NowPlaying>, AlbumProviderError> {
        let playback: Option<wire::SpotifyPlayback> = self.get_json("currently_playing", &[])?;
        Ok(playback.and_then(|p| p.item).map(wire::now_playing_from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_cleanly() {
        let b = HttpBackend::new("https://example.com/", Flavor::Discogs, 1000);
        assert_eq!(b.url("/search"), "https://example.com/search");
        assert_eq!(b.url("download_album_cover"), "https://example.com/download_album_cover");
    }

    #[test]
    fn unreachable_backend_is_a_network_error() {
        // Port 9 on localhost: nothing listens there in a test sandbox.
        let b = HttpBackend::new("http://127.0.0.1:9", Flavor::Discogs, 500);
        assert!(matches!(b.search("anything"), Err(AlbumProviderError::Network(_))));
        assert!(matches!(b.fetch_cover("http://x/y.jpg", 10, 10), Err(AlbumProviderError::Network(_))));
        assert_eq!(b.search(""), Err(AlbumProviderError::InvalidInput));
    }
}
