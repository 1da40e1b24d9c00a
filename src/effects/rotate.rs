use crate::config::{PipelineOptions, RotateOptions};
use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::Frame;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::foundation::math::{min_lcm_candidate, window_around};
use crate::render::raster::{center_on_canvas, rotate_expanded};
use crate::render::stream::FrameStream;
use crate::timeline::expand::loop_frames;

/// How a sequence of `len` frames is spun through one full turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationPlan {
    /// Degrees added per frame index.
    pub step_degrees: f64,
    /// Extra cycles of the source needed to finish the turn.
    pub extra_cycles: usize,
}

impl RotationPlan {
    /// Plan a rotation of `len` frames over roughly `circle_divisions` steps.
    ///
    /// Long sequences spread an integer number of turns over their own length; short ones loop
    /// until their length lines up with a nearby division count.
    pub fn new(len: usize, circle_divisions: u32) -> LoopsmithResult<Self> {
        if circle_divisions == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "rotation circle_divisions must be >= 1",
            ));
        }
        let n = len as u64;
        let d = u64::from(circle_divisions);
        if n > d {
            return Ok(Self {
                step_degrees: (n / d) as f64 * 360.0 / n as f64,
                extra_cycles: 0,
            });
        }

        let (divisions, target) = min_lcm_candidate(n, window_around(d, 2, 1)).ok_or_else(|| {
            LoopsmithError::contract(
                Stage::Transform,
                format!("no rotation division fits {len} frames near {circle_divisions}"),
            )
        })?;
        Ok(Self {
            step_degrees: 360.0 / divisions as f64,
            extra_cycles: (target / n - 1) as usize,
        })
    }
}

impl<'a> FrameStream<'a> {
    /// Spin the sequence through a full clockwise turn.
    ///
    /// Frame `i` (re-stamped from 1) is rotated by `step * i` degrees into an expanded box and then
    /// centred on a transparent canvas the size of the first input frame, so every output frame
    /// keeps the original dimensions. Short sequences are looped first (see [`RotationPlan`]).
    #[tracing::instrument(skip_all, fields(divisions = options.circle_divisions))]
    pub fn rotate(
        self,
        options: &RotateOptions,
        pipeline: &PipelineOptions,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<FrameStream<'a>> {
        options.validate()?;
        let seq = self.collect_sequence(cancel)?;
        let Some((width, height)) = seq.first().map(Frame::dimensions) else {
            return Ok(FrameStream::empty());
        };

        let plan = RotationPlan::new(seq.len(), options.circle_divisions)?;
        tracing::debug!(
            frames = seq.len(),
            step_degrees = plan.step_degrees,
            extra_cycles = plan.extra_cycles,
            "rotation planned"
        );

        let step = plan.step_degrees;
        let spin = move |frame: Frame, _: &CancellationToken| -> LoopsmithResult<Frame> {
            let degrees = step * f64::from(frame.index);
            let rotated = rotate_expanded(frame.image(), degrees);
            Ok(frame.replace_image(center_on_canvas(&rotated, width, height)))
        };

        Ok(loop_frames(seq, plan.extra_cycles)
            .cancellable(cancel, Stage::Expander)
            .for_each(spin, pipeline, cancel))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/rotate.rs"]
mod tests;
