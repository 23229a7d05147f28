//! Shared data model, configuration, and error types for the terminal
//! video player.
//!
//! This crate contains the types and small synchronization primitives
//! shared across the decode, convert, store, playback, and app crates:
//! it has no subprocess or terminal I/O of its own.
pub mod artifact;
pub mod cancel;
pub mod config;
pub mod error;
pub mod playlist;
pub mod speed;
pub mod state;

pub use artifact::{frame_image_path, IMAGE_FILENAME_TEMPLATE};
pub use cancel::CancelScope;
pub use config::{ColorMode, DitherMode, PlayerConfig, ScaleMode, SymbolSet};
pub use error::PlayerError;
pub use playlist::Playlist;
pub use state::{PlaybackState, UserAction};
