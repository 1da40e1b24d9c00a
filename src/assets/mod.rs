//! Frame sources.

/// Decoding encoded images and frame directories.
pub mod source;
