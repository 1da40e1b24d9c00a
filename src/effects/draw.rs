//! Overlay compositing: draw an image onto every frame, or merge synchronized pairs.
//!
//! Where and how large the overlay lands is decided per frame by two strategies, a [`Sizer`] and a
//! [`Positioner`]. Closures implement both, and [`Resizer`] / [`Layout`] cover the common cases.

use image::RgbaImage;

use crate::effects::composite::draw_over;
use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::Frame;
use crate::foundation::error::LoopsmithResult;
use crate::render::pipeline::{FrameMerger, FrameProcessor};
use crate::render::raster::resize;

/// Chooses the size an overlay is resampled to before it is drawn onto `frame`.
pub trait Sizer: Send + Sync {
    /// `(width, height)` for `overlay` on `frame`.
    fn size(&self, overlay: &RgbaImage, frame: &Frame) -> (u32, u32);
}

impl<F> Sizer for F
where
    F: Fn(&RgbaImage, &Frame) -> (u32, u32) + Send + Sync,
{
    fn size(&self, overlay: &RgbaImage, frame: &Frame) -> (u32, u32) {
        self(overlay, frame)
    }
}

/// Chooses the top-left corner of the already resized overlay on `frame`. May be negative.
pub trait Positioner: Send + Sync {
    /// Top-left corner for `overlay` on `frame`.
    fn position(&self, overlay: &RgbaImage, frame: &Frame) -> (i64, i64);
}

impl<F> Positioner for F
where
    F: Fn(&RgbaImage, &Frame) -> (i64, i64) + Send + Sync,
{
    fn position(&self, overlay: &RgbaImage, frame: &Frame) -> (i64, i64) {
        self(overlay, frame)
    }
}

/// Preset sizers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resizer {
    /// Fit inside the frame keeping the aspect ratio; never upscale.
    Auto,
    /// Exact size in pixels.
    Fixed(u32, u32),
    /// Uniform scale factor.
    Scale(f32),
}

impl Sizer for Resizer {
    fn size(&self, overlay: &RgbaImage, frame: &Frame) -> (u32, u32) {
        let (ow, oh) = overlay.dimensions();
        match *self {
            Resizer::Auto => {
                let (fw, fh) = frame.dimensions();
                if ow == 0 || oh == 0 {
                    return (ow, oh);
                }
                let scale = (f64::from(fw) / f64::from(ow))
                    .min(f64::from(fh) / f64::from(oh))
                    .min(1.0);
                (scaled(ow, scale), scaled(oh, scale))
            }
            Resizer::Fixed(w, h) => (w, h),
            Resizer::Scale(s) => (scaled(ow, f64::from(s)), scaled(oh, f64::from(s))),
        }
    }
}

fn scaled(len: u32, scale: f64) -> u32 {
    (f64::from(len) * scale).round().max(1.0) as u32
}

/// Preset positioners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Flush with the left and bottom edges.
    LeftBottom,
    /// Flush right, vertically centered.
    RightCenter,
    /// Centered on both axes.
    Center,
    /// Fixed top-left corner.
    At(i64, i64),
}

impl Positioner for Layout {
    fn position(&self, overlay: &RgbaImage, frame: &Frame) -> (i64, i64) {
        let (fw, fh) = (i64::from(frame.width()), i64::from(frame.height()));
        let (ow, oh) = (i64::from(overlay.width()), i64::from(overlay.height()));
        match *self {
            Layout::LeftBottom => (0, fh - oh),
            Layout::RightCenter => (fw - ow, (fh - oh) / 2),
            Layout::Center => ((fw - ow) / 2, (fh - oh) / 2),
            Layout::At(x, y) => (x, y),
        }
    }
}

fn draw_onto(
    frame: &mut Frame,
    overlay: &RgbaImage,
    sizer: &dyn Sizer,
    positioner: &dyn Positioner,
) -> LoopsmithResult<()> {
    let (w, h) = sizer.size(overlay, frame);
    let resized = resize(overlay, w, h);
    let (x, y) = positioner.position(&resized, frame);
    frame.mutate(|img| draw_over(img, &resized, x, y, 1.0))
}

/// [`FrameProcessor`] that draws a fixed overlay onto every frame.
///
/// The overlay itself is never modified; each frame gets a resized working copy.
#[derive(Debug)]
pub struct Draw<S, P> {
    overlay: RgbaImage,
    sizer: S,
    positioner: P,
}

impl<S: Sizer, P: Positioner> Draw<S, P> {
    /// Draw `overlay` on every frame, sized by `sizer` and placed by `positioner`.
    pub fn new(overlay: RgbaImage, sizer: S, positioner: P) -> Self {
        Self {
            overlay,
            sizer,
            positioner,
        }
    }
}

impl<S: Sizer, P: Positioner> FrameProcessor for Draw<S, P> {
    fn process(&self, frame: Frame, _cancel: &CancellationToken) -> LoopsmithResult<Frame> {
        let mut frame = frame;
        draw_onto(&mut frame, &self.overlay, &self.sizer, &self.positioner)?;
        Ok(frame)
    }
}

/// [`FrameMerger`] that draws the second frame of each pair onto the first and drops it.
#[derive(Debug)]
pub struct DrawMerger<S, P> {
    sizer: S,
    positioner: P,
}

impl<S: Sizer, P: Positioner> DrawMerger<S, P> {
    /// Merge pairs by drawing the second frame with `sizer` and `positioner`.
    pub fn new(sizer: S, positioner: P) -> Self {
        Self { sizer, positioner }
    }
}

impl<S: Sizer, P: Positioner> FrameMerger for DrawMerger<S, P> {
    fn merge(&self, a: Frame, b: Frame, _cancel: &CancellationToken) -> LoopsmithResult<Frame> {
        let mut a = a;
        draw_onto(&mut a, b.image(), &self.sizer, &self.positioner)?;
        Ok(a)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/draw.rs"]
mod tests;
