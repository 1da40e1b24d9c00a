//! Frame transforms built on the pipeline.

/// Premultiplied alpha-over compositing.
pub mod composite;
/// Overlay drawing and its sizing/positioning strategies.
pub mod draw;
/// Alpha matting over a caller-supplied mask model.
pub mod matting;
/// Zoom-style radial blur.
pub mod radial_blur;
/// Full-turn rotation.
pub mod rotate;
/// Wrap-around panning.
pub mod slide;
