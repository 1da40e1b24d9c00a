//! Final artifacts and the ways they leave the process.

/// Auto-compose: stream to still or animation.
pub mod compose;
/// External `ffmpeg` transcoding.
pub mod ffmpeg;
/// Artifact types.
pub mod meme;
/// PNG and GIF writers.
pub mod writer;
