use image::RgbaImage;

use crate::config::SlideOptions;
use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::Frame;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::foundation::math::{min_lcm_candidate, window_around};
use crate::render::raster::blit;
use crate::render::stream::FrameStream;

/// Period and total length of a slide over `len` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlidePlan {
    /// Frames per full canvas sweep.
    pub period: usize,
    /// Output length, a multiple of both `len` and `period`.
    pub target: usize,
}

impl SlidePlan {
    /// Pick the period near `total_moves` whose lcm with `len` is smallest.
    pub fn new(len: usize, total_moves: u32) -> LoopsmithResult<Self> {
        let (period, target) = min_lcm_candidate(
            len as u64,
            window_around(u64::from(total_moves), 2, 1),
        )
        .ok_or_else(|| {
            LoopsmithError::contract(
                Stage::Transform,
                format!("no slide period fits {len} frames near {total_moves}"),
            )
        })?;
        Ok(Self {
            period: period as usize,
            target: target as usize,
        })
    }

    /// Offset of output frame `i` (0-based) on a `width x height` canvas.
    pub fn offset(
        &self,
        i: usize,
        horizontal: i8,
        vertical: i8,
        width: u32,
        height: u32,
    ) -> (i64, i64) {
        let phase = (i % self.period) as i64;
        let period = self.period as i64;
        let dx = i64::from(horizontal) * phase * i64::from(width) / period;
        let dy = i64::from(vertical) * phase * i64::from(height) / period;
        (dx, dy)
    }
}

/// Positions a frame is drawn at for offset `(dx, dy)`: the trailing copy first, then its
/// wrap-around neighbours, without duplicates on idle axes.
fn wrap_positions(dx: i64, dy: i64, h: i64, v: i64, width: i64, height: i64) -> Vec<(i64, i64)> {
    let mut out = Vec::with_capacity(4);
    for pos in [
        (dx, dy),
        (dx - h * width, dy),
        (dx, dy - v * height),
        (dx - h * width, dy - v * height),
    ] {
        if !out.contains(&pos) {
            out.push(pos);
        }
    }
    out
}

impl<'a> FrameStream<'a> {
    /// Pan the frames across their own canvas and wrap them around the edges.
    ///
    /// The output holds `lcm(len, period)` frames, each the size of the first input frame and
    /// indexed from 1. Output frame `i` draws the looped source frame `i` as the trailing copy and
    /// frame `(i + period / 2) mod target` as the leading copies that wrap in from the opposite
    /// edge. Every period starts from the same geometry so the loop boundary is seamless.
    #[tracing::instrument(skip_all, fields(h = options.horizontal, v = options.vertical))]
    pub fn slide(
        self,
        options: &SlideOptions,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<FrameStream<'a>> {
        options.validate()?;
        let frames = self.collect_sequence(cancel)?.into_frames();
        let Some((width, height)) = frames.first().map(Frame::dimensions) else {
            return Ok(FrameStream::empty());
        };

        let plan = SlidePlan::new(frames.len(), options.total_moves)?;
        tracing::debug!(
            frames = frames.len(),
            period = plan.period,
            target = plan.target,
            "slide planned"
        );

        // `target` is a whole number of source cycles, so looped frame `j` is source `j % len`.
        let half = plan.period / 2;
        let (h, v) = (options.horizontal, options.vertical);
        let cancel = cancel.clone();
        let mut i = 0usize;

        Ok(FrameStream::new(std::iter::from_fn(move || {
            if i >= plan.target {
                return None;
            }
            if let Err(e) = cancel.check(Stage::Transform) {
                return Some(Err(e));
            }
            let trailing = &frames[i % frames.len()];
            let leading = &frames[(i + half) % frames.len()];
            let (dx, dy) = plan.offset(i, h, v, width, height);

            let mut canvas = RgbaImage::new(width, height);
            let positions = wrap_positions(
                dx,
                dy,
                i64::from(h),
                i64::from(v),
                i64::from(width),
                i64::from(height),
            );
            for (n, (x, y)) in positions.into_iter().enumerate() {
                let src = if n == 0 { trailing } else { leading };
                blit(&mut canvas, src.image(), x, y);
            }

            i += 1;
            Some(Ok(trailing.derive(i as u32, canvas)))
        })))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/slide.rs"]
mod tests;
