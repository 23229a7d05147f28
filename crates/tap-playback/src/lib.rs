//! Playback Engine: paces frame display against the target frame rate,
//! renders decoded frames and the status line to the terminal, and
//! resolves each cycle to a [`engine::CycleOutcome`].

pub mod engine;
pub mod status;
pub mod timing;

pub use engine::{CycleOutcome, PlaybackEngine};
pub use status::{format_status_line, StateTag};
