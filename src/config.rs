//! Option structs for every stage plus the aggregated, JSON-loadable [`MemeConfig`].
//!
//! Defaults are explicit: rotation divides the circle into 16 steps, slides pan over 16 moves,
//! radial blur takes 10 samples and the pipeline processes 64 frames per chunk.

use std::io::Read;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};

/// Default number of rotation steps per full turn.
pub const DEFAULT_CIRCLE_DIVISIONS: u32 = 16;
/// Default slide period in frames.
pub const DEFAULT_TOTAL_MOVES: u32 = 16;
/// Default radial blur sample count.
pub const DEFAULT_BLUR_ITERATIONS: u32 = 10;
/// Default per-frame delay written by auto-compose, in centiseconds.
pub const DEFAULT_FRAME_DELAY_CS: u16 = 0;

/// Chunking and threading for [`FrameStream::for_each`](crate::FrameStream::for_each).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Process each chunk on a rayon pool when `true`.
    pub parallel: bool,
    /// Frames pulled per chunk (`0` behaves like `1`).
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

impl PipelineOptions {
    /// Parallel options with the default chunk size.
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    /// Reject settings the worker pool cannot honor.
    pub fn validate(&self) -> LoopsmithResult<()> {
        if self.threads == Some(0) {
            return Err(LoopsmithError::contract(
                Stage::Pipeline,
                "pipeline 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Options for [`FrameStream::rotate`](crate::FrameStream::rotate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateOptions {
    /// Approximate number of rotation steps per full turn.
    pub circle_divisions: u32,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            circle_divisions: DEFAULT_CIRCLE_DIVISIONS,
        }
    }
}

impl RotateOptions {
    /// Reject a zero division count.
    pub fn validate(&self) -> LoopsmithResult<()> {
        if self.circle_divisions == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "rotation circle_divisions must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Options for [`FrameStream::slide`](crate::FrameStream::slide).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideOptions {
    /// Horizontal direction: `-1` left, `0` none, `1` right.
    pub horizontal: i8,
    /// Vertical direction: `-1` up, `0` none, `1` down.
    pub vertical: i8,
    /// Approximate number of frames for one full canvas sweep.
    pub total_moves: u32,
}

impl Default for SlideOptions {
    fn default() -> Self {
        Self {
            horizontal: 1,
            vertical: 0,
            total_moves: DEFAULT_TOTAL_MOVES,
        }
    }
}

impl SlideOptions {
    /// Slide along the given directions with the default period.
    pub fn new(horizontal: i8, vertical: i8) -> Self {
        Self {
            horizontal,
            vertical,
            ..Self::default()
        }
    }

    /// Reject directions outside `{-1, 0, 1}`, a motionless slide, or a zero period.
    pub fn validate(&self) -> LoopsmithResult<()> {
        for (name, d) in [("horizontal", self.horizontal), ("vertical", self.vertical)] {
            if !(-1..=1).contains(&d) {
                return Err(LoopsmithError::contract(
                    Stage::Transform,
                    format!("slide {name} direction must be -1, 0 or 1 (got {d})"),
                ));
            }
        }
        if self.horizontal == 0 && self.vertical == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "slide needs at least one non-zero direction",
            ));
        }
        if self.total_moves == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "slide total_moves must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Options for [`FrameStream::auto_compose`](crate::FrameStream::auto_compose).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Per-frame delay override in centiseconds; [`DEFAULT_FRAME_DELAY_CS`] when unset.
    pub frame_delay_cs: Option<u16>,
}

impl ComposeOptions {
    /// Delay written to every animation frame.
    pub fn frame_delay(&self) -> u16 {
        self.frame_delay_cs.unwrap_or(DEFAULT_FRAME_DELAY_CS)
    }
}

/// Options for [`encode_meme`](crate::encode_meme).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Color that non-transparent GIF frames are flattened over (RGBA8, straight alpha).
    pub background_rgba: [u8; 4],
    /// GIF quantizer speed, `1` (best) to `30` (fastest).
    pub gif_speed: i32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            background_rgba: [255, 255, 255, 255],
            gif_speed: 10,
        }
    }
}

impl EncodeOptions {
    /// Reject a quantizer speed outside `1..=30`.
    pub fn validate(&self) -> LoopsmithResult<()> {
        if !(1..=30).contains(&self.gif_speed) {
            return Err(LoopsmithError::contract(
                Stage::Encode,
                format!("gif_speed must be in 1..=30 (got {})", self.gif_speed),
            ));
        }
        Ok(())
    }
}

/// Options for [`RadialBlur`](crate::RadialBlur).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialBlurOptions {
    /// Blur center in pixels; the image center when unset.
    pub center: Option<(u32, u32)>,
    /// Samples averaged along each ray.
    pub iterations: u32,
}

impl Default for RadialBlurOptions {
    fn default() -> Self {
        Self {
            center: None,
            iterations: DEFAULT_BLUR_ITERATIONS,
        }
    }
}

impl RadialBlurOptions {
    /// Reject a zero sample count.
    pub fn validate(&self) -> LoopsmithResult<()> {
        if self.iterations == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "radial blur iterations must be >= 1",
            ));
        }
        Ok(())
    }
}

/// Every stage's options in one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemeConfig {
    /// Apply-stage chunking and threading.
    pub pipeline: PipelineOptions,
    /// Rotation.
    pub rotate: RotateOptions,
    /// Slide.
    pub slide: SlideOptions,
    /// Auto-compose.
    pub compose: ComposeOptions,
    /// Encoding.
    pub encode: EncodeOptions,
    /// Radial blur.
    pub radial_blur: RadialBlurOptions,
}

impl MemeConfig {
    /// Parse and validate a JSON document. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> LoopsmithResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .context("parse meme config JSON")
            .map_err(|e| LoopsmithError::upstream(Stage::Pipeline, e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`MemeConfig::from_json_str`], reading from `reader`.
    pub fn from_json_reader(reader: impl Read) -> LoopsmithResult<Self> {
        let cfg: Self = serde_json::from_reader(reader)
            .context("read meme config JSON")
            .map_err(|e| LoopsmithError::upstream(Stage::Pipeline, e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    pub fn validate(&self) -> LoopsmithResult<()> {
        self.pipeline.validate()?;
        self.rotate.validate()?;
        self.slide.validate()?;
        self.encode.validate()?;
        self.radial_blur.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
