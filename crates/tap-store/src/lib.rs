//! Frame Store: the bounded ordered buffer of rendered frames that sits
//! between the converter pool and the playback engine, addressed by
//! frame index with readiness and room-available signaling.

pub mod store;

pub use store::FrameStore;
