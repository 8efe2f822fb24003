use std::fmt;

/// Failures reported by the album search / cover / playback collaborators.
///
/// None of these are fatal: the session turns each one into a UI state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlbumProviderError {
    /// Backend unreachable, timed out, or answered with a non-success status.
    Network(String),
    /// Cover bytes arrived but are not a usable image.
    Decode(String),
    /// The search succeeded but matched nothing.
    NoResults,
    /// The query was empty.
    InvalidInput,
}

impl fmt::Display for AlbumProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlbumProviderError::Network(msg) => write!(f, "network error: {msg}"),
            AlbumProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            AlbumProviderError::NoResults => f.write_str("no results"),
            AlbumProviderError::InvalidInput => f.write_str("empty search query"),
        }
    }
}

impl std::error::Error for AlbumProviderError {}
