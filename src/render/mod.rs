//! Frame streams and the stages that drive them.

/// Chunked per-frame apply and zip-merge.
pub mod pipeline;
/// Pixel-level resampling, rotation and placement.
pub mod raster;
/// The lazy frame stream type.
pub mod stream;
