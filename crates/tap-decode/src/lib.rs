//! Decoder Driver: spawns and supervises the external frame extractor
//! (default `ffmpeg`) that turns a source video into a numbered sequence
//! of JPEG images on a scratch directory, plus the `ffprobe` metadata
//! probe that sizes the playback cycle ahead of it.

pub mod driver;
pub mod probe;
pub mod stderr_ring;

pub use driver::{build_ffmpeg_args, build_scale_filter, DecoderHandle, OUTPUT_TEMPLATE};
pub use probe::{estimate_total_frames, probe_video, VideoInfo};
pub use stderr_ring::StderrRing;
