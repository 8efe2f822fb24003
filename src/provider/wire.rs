//! JSON shapes spoken by the search/cover/playback backends, and their
//! conversion into the crate's own types.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Album, Device, NowPlaying};
use crate::error::AlbumProviderError;

#[derive(Debug, Default, Deserialize)]
pub struct DiscogsSearch {
    #[serde(default)]
    pub results: Vec<DiscogsRelease>,
}

#[derive(Debug, Deserialize)]
pub struct DiscogsRelease {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpotifySearch {
    #[serde(default)]
    pub albums: SpotifyPage<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for SpotifyPage<T> {
    fn default() -> Self { Self { items: Vec::new() } }
}

#[derive(Debug, Deserialize)]
pub struct SpotifyAlbum {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyTrack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyDevices {
    #[serde(default)]
    pub devices: Vec<SpotifyDevice>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyDevice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyPlayback {
    #[serde(default)]
    pub item: Option<SpotifyTrack>,
}

#[derive(Debug, Serialize)]
pub struct CoverRequest<'a> {
    pub image_url: &'a str,
    pub target_width: u32,
    pub target_height: u32,
}

#[derive(Debug, Deserialize)]
pub struct CoverResponse {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayRequest<'a> {
    pub uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<&'a str>,
    pub position_ms: u64,
}

/// Discogs titles come as `"Artist - Album"`; only releases are kept and
/// repeated artist/album pairs are dropped.
pub fn albums_from_discogs(search: DiscogsSearch) -> Vec<Album> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for r in search.results {
        if r.kind != "release" {
            continue;
        }
        let (artist, album_name) = match r.title.split_once(" - ") {
            Some((a, t)) => (a.trim().to_string(), t.trim().to_string()),
            None => ("Unknown".to_string(), r.title.clone()),
        };
        if !seen.insert(format!("{artist}|{album_name}")) {
            continue;
        }
        let id = match &r.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "0".to_string(),
            other => other.to_string(),
        };
        let cover_url = r.thumb.filter(|u| !u.is_empty()).or(r.cover_image).filter(|u| !u.is_empty());
        out.push(Album { title: r.title, artist, id, cover_url });
    }
    out
}

pub fn albums_from_spotify(search: SpotifySearch) -> Vec<Album> {
    search
        .albums
        .items
        .into_iter()
        .map(|a| Album {
            artist: first_artist(&a.artists).unwrap_or_else(|| "Unknown Artist".to_string()),
            cover_url: a.images.into_iter().next().map(|i| i.url),
            title: a.name,
            id: a.uri,
        })
        .collect()
}

pub fn first_artist(artists: &[SpotifyArtist]) -> Option<String> {
    artists.first().map(|a| a.name.clone()).filter(|n| !n.is_empty())
}

/// Unpacks the base64 payload of a cover response.
pub fn cover_bytes(resp: CoverResponse) -> Result<Vec<u8>, AlbumProviderError> {
    if resp.status != 200 {
        let why = resp.error.unwrap_or_else(|| format!("status {}", resp.status));
        return Err(AlbumProviderError::Network(why));
    }
    let data = resp.data.filter(|d| !d.is_empty()).ok_or_else(|| AlbumProviderError::Network("empty cover payload".into()))?;
    let bytes = STANDARD.decode(data.trim()).map_err(|e| AlbumProviderError::Decode(e.to_string()))?;
    if let Some(size) = resp.size {
        if size != bytes.len() as u64 {
            tracing::debug!(expected = size, actual = bytes.len(), "cover size mismatch");
        }
    }
    Ok(bytes)
}

/// Where to start a track: anywhere that still leaves the last 30 seconds.
pub fn start_position<R: Rng>(track: &SpotifyTrack, rng: &mut R) -> u64 {
    rng.gen_range(0..=track.duration_ms.saturating_sub(30_000))
}

pub fn now_playing_from(track: SpotifyTrack) -> NowPlaying {
    NowPlaying {
        artist: first_artist(&track.artists).unwrap_or_else(|| "Unknown Artist".to_string()),
        song: track.name,
    }
}

pub fn devices_from(devices: SpotifyDevices) -> Vec<Device> {
    devices
        .devices
        .into_iter()
        .filter_map(|d| Some(Device { id: d.id?, name: d.name, is_active: d.is_active }))
        .collect()
}

/// The device playback should go to: the active one, else the first.
pub fn pick_device(devices: &[Device]) -> Option<&Device> {
    devices.iter().find(|d| d.is_active).or_else(|| devices.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discogs_results_are_filtered_and_split() {
        let json = r#"{"results": [
            {"title": "Nirvana - Nevermind", "id": 367084, "type": "release", "thumb": "https://i.discogs.com/a.jpg"},
            {"title": "Nirvana - Nevermind", "id": 111, "type": "release", "thumb": "https://i.discogs.com/b.jpg"},
            {"title": "Nirvana", "id": 125246, "type": "artist"},
            {"title": "Untitled Bootleg", "id": 5, "type": "release", "thumb": "", "cover_image": "https://i.discogs.com/c.jpg"}
        ]}"#;
        let albums = albums_from_discogs(serde_json::from_str(json).unwrap());
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].artist, "Nirvana");
        assert_eq!(albums[0].id, "367084");
        assert_eq!(albums[0].cover_url.as_deref(), Some("https://i.discogs.com/a.jpg"));
        assert_eq!(albums[1].artist, "Unknown");
        assert_eq!(albums[1].title, "Untitled Bootleg");
        assert_eq!(albums[1].cover_url.as_deref(), Some("https://i.discogs.com/c.jpg"));
    }

    #[test]
    fn discogs_thumb_falls_back_to_cover_image() {
        let json = r#"{"results": [{"title": "A - B", "id": 1, "type": "release", "cover_image": "https://x/c.jpg"}]}"#;
        let albums = albums_from_discogs(serde_json::from_str(json).unwrap());
        assert_eq!(albums[0].cover_url.as_deref(), Some("https://x/c.jpg"));
    }

    #[test]
    fn spotify_albums_take_first_artist_and_image() {
        let json = r#"{"albums": {"items": [
            {"name": "Demo Album (Desktop Mode)", "uri": "spotify:album:demo123",
             "images": [{"url": "https://example.com/demo.jpg"}, {"url": "https://example.com/small.jpg"}],
             "artists": [{"name": "Demo Artist"}, {"name": "Guest"}]},
            {"name": "Bare", "uri": "spotify:album:bare"}
        ]}}"#;
        let albums = albums_from_spotify(serde_json::from_str(json).unwrap());
        assert_eq!(albums[0].artist, "Demo Artist");
        assert_eq!(albums[0].cover_url.as_deref(), Some("https://example.com/demo.jpg"));
        assert_eq!(albums[1].artist, "Unknown Artist");
        assert_eq!(albums[1].cover_url, None);
    }

    #[test]
    fn missing_result_lists_parse_as_empty() {
        let d: DiscogsSearch = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert!(albums_from_discogs(d).is_empty());
        let s: SpotifySearch = serde_json::from_str("{}").unwrap();
        assert!(albums_from_spotify(s).is_empty());
    }

    #[test]
    fn cover_payload_is_base64() {
        let ok: CoverResponse = serde_json::from_str(r#"{"status": 200, "data": "aGVsbG8=", "size": 5}"#).unwrap();
        assert_eq!(cover_bytes(ok).unwrap(), b"hello");

        let failed: CoverResponse = serde_json::from_str(r#"{"status": 500, "error": "upstream 404"}"#).unwrap();
        assert_eq!(cover_bytes(failed), Err(AlbumProviderError::Network("upstream 404".into())));

        let garbled: CoverResponse = serde_json::from_str(r#"{"status": 200, "data": "!!!"}"#).unwrap();
        assert!(matches!(cover_bytes(garbled), Err(AlbumProviderError::Decode(_))));
    }

    #[test]
    fn active_device_wins() {
        let devices = devices_from(serde_json::from_str(r#"{"devices": [
            {"id": "a", "name": "Phone", "is_active": false},
            {"id": null, "name": "Ghost", "is_active": true},
            {"id": "c", "name": "Laptop", "is_active": true}
        ]}"#).unwrap());
        assert_eq!(devices.len(), 2);
        assert_eq!(pick_device(&devices).map(|d| d.name.as_str()), Some("Laptop"));
        assert_eq!(pick_device(&devices[..1]).map(|d| d.id.as_str()), Some("a"));
        assert!(pick_device(&[]).is_none());
    }

    #[test]
    fn start_position_leaves_the_last_thirty_seconds() {
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let long: SpotifyTrack = serde_json::from_str(r#"{"name": "a", "uri": "u", "duration_ms": 90000}"#).unwrap();
        for _ in 0..50 {
            assert!(start_position(&long, &mut rng) <= 60_000);
        }
        let positions: std::collections::HashSet<u64> = (0..20).map(|_| start_position(&long, &mut rng)).collect();
        assert!(positions.len() > 1);

        let short: SpotifyTrack = serde_json::from_str(r#"{"name": "b", "uri": "v", "duration_ms": 12000}"#).unwrap();
        assert_eq!(start_position(&short, &mut rng), 0);
        let unknown: SpotifyTrack = serde_json::from_str(r#"{"name": "c", "uri": "w"}"#).unwrap();
        assert_eq!(start_position(&unknown, &mut rng), 0);
    }

    #[test]
    fn play_request_omits_missing_device() {
        let body = serde_json::to_value(PlayRequest { uri: "spotify:track:1", device_id: None, position_ms: 0 }).unwrap();
        assert_eq!(body, serde_json::json!({"uri": "spotify:track:1", "position_ms": 0}));
    }
}
