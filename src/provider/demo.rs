use super::{Album, AlbumProvider, Device, NowPlaying, Playback};
use crate::bitmap::Bitmap;
use crate::cover;
use crate::error::AlbumProviderError;

/// Offline backend: two canned albums for any query, procedural covers.
#[derive(Default, Clone, Copy)]
pub struct DemoProvider;

impl AlbumProvider for DemoProvider {
    fn search(&self, query: &str) -> Result<Vec<Album>, AlbumProviderError> {
        if query.trim().is_empty() {
            return Err(AlbumProviderError::InvalidInput);
        }
        Ok(vec![
            Album {
                title: "Demo Album (Desktop Mode)".to_string(),
                artist: "Demo Artist".to_string(),
                id: "12345".to_string(),
                cover_url: Some("demo://12345".to_string()),
            },
            Album {
                title: "Test Album 2".to_string(),
                artist: "Test Artist".to_string(),
                id: "67890".to_string(),
                cover_url: Some("demo://67890".to_string()),
            },
        ])
    }

    fn fetch_cover(&self, url: &str, target_w: u32, target_h: u32) -> Result<Bitmap, AlbumProviderError> {
        Ok(cover::placeholder(target_w, target_h, cover::seed_for(url)))
    }
}

/// Playback for backends that can't play anything.
#[derive(Default, Clone, Copy)]
pub struct NoPlayback;

impl Playback for NoPlayback {
    fn play_album(&self, _album: &Album) -> Result<NowPlaying, AlbumProviderError> {
        Ok(NowPlaying { song: "Discogs Album".to_string(), artist: "No Playback Available".to_string() })
    }

    fn pause(&self) -> Result<(), AlbumProviderError> { Ok(()) }

    fn devices(&self) -> Result<Vec<Device>, AlbumProviderError> { Ok(Vec::new()) }

    fn currently_playing(&self) -> Result<Option<NowPlaying>, AlbumProviderError> { Ok(None) }
}
