//! Loopsmith builds looping meme animations out of frame sequences.
//!
//! Frames flow through lazy [`FrameStream`]s:
//!
//! - Load frames with [`decode_frames`] or [`load_dir`]
//! - Expand, synchronize and transform them ([`FrameStream::loop_cycles`],
//!   [`FrameStream::zip_merge`], [`FrameStream::rotate`], [`FrameStream::slide`], [`Draw`], ...)
//! - Flatten the result with [`FrameStream::auto_compose`] and write it with [`encode_meme`]
//!
//! Every stage takes a [`CancellationToken`]; dropping a stream releases every frame it holds.
#![forbid(unsafe_code)]

mod foundation;

/// Frame sources.
pub mod assets;
/// Stage options and the aggregated JSON config.
pub mod config;
/// Frame transforms.
pub mod effects;
/// Artifacts, writers and external transcoding.
pub mod encode;
/// Streams, the apply stage and raster helpers.
pub mod render;
/// Cycle expansion and synchronization.
pub mod timeline;

pub use crate::foundation::cancel::CancellationToken;
pub use crate::foundation::core::{BufferLedger, Frame, GrayImage, RgbaImage, Sequence};
pub use crate::foundation::error::{BoxError, LoopsmithError, LoopsmithResult, Stage};

pub use crate::assets::source::{decode_frames, load_dir, open_frames};
pub use crate::config::{
    ComposeOptions, EncodeOptions, MemeConfig, PipelineOptions, RadialBlurOptions, RotateOptions,
    SlideOptions,
};
pub use crate::effects::draw::{Draw, DrawMerger, Layout, Positioner, Resizer, Sizer};
pub use crate::effects::matting::{MaskModel, MattingConfig, apply_mask};
pub use crate::effects::radial_blur::RadialBlur;
pub use crate::effects::rotate::RotationPlan;
pub use crate::effects::slide::SlidePlan;
pub use crate::encode::ffmpeg::{FfmpegTranscode, is_ffmpeg_on_path};
pub use crate::encode::meme::{Animation, AnimationFrame, Disposal, Meme, MemeFormat, Repeat};
pub use crate::encode::writer::encode_meme;
pub use crate::render::pipeline::{FrameMerger, FrameProcessor};
pub use crate::render::stream::FrameStream;
pub use crate::timeline::expand::{duplicate_frames, loop_frames};
pub use crate::timeline::sync::{FramePair, LcmSynchronizer, SyncPlan, Synchronizer, synchronize};
