use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the player, matching the policy table the playback
/// cycle follows: `Startup` errors are fatal before raw mode is entered,
/// everything else is recoverable at the cycle level.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Decoder binary missing, scratch directory unwritable, source not
    /// found — must abort before the terminal enters raw mode.
    #[error("startup failed: {0}")]
    Startup(String),

    /// Source path does not exist or is not readable.
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    /// `ffprobe` (or equivalent) could not determine duration/fps.
    /// Recoverable: playback proceeds with `total_frames = 0`.
    #[error("metadata probe failed: {0}")]
    Metadata(String),

    /// The decoder process exited non-zero mid-cycle.
    /// Recoverable: the cycle plays back whatever was extracted.
    #[error("decoder exited with an error: {0}")]
    Extraction(String),

    /// The converter process failed on a single frame.
    /// Recoverable per frame: the frame is skipped.
    #[error("converter failed on frame {index}: {message}")]
    Render {
        /// Frame index that failed to render.
        index: u64,
        /// Converter's own error text, if any.
        message: String,
    },

    /// A terminal write failed. Cycle-fatal: the cycle is cancelled and
    /// control returns to the playlist loop.
    #[error("terminal write failed: {0}")]
    Display(String),
}
