//! DiscogSnake: a snake game that uncovers an album cover tile by tile.
//!
//! Everything here is independent of the window; the `discogsnake` binary
//! draws a [`session::Session`] and feeds it [`session::Input`]s.

pub mod bitmap;
pub mod config;
pub mod cover;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod provider;
pub mod reveal;
pub mod session;
pub mod snake;
pub mod tiler;

pub use bitmap::Bitmap;
pub use config::{Backend, GameConfig};
pub use error::AlbumProviderError;
pub use grid::{Board, Cell, Direction, Pos};
pub use provider::{Album, AlbumProvider, NowPlaying, Playback};
pub use session::{Input, Outcome, SearchStatus, Session, State};
pub use tiler::TileSet;
