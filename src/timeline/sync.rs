use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::{Frame, Sequence};
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::foundation::math::min_lcm_candidate;
use crate::render::stream::FrameStream;
use crate::timeline::expand::loop_frames;

/// Frame pair produced by a [`Synchronizer`]. The merge step owns and drops the second frame.
pub type FramePair = (Frame, Frame);

/// Pairs the frames of a stream with the frames of another sequence.
pub trait Synchronizer {
    /// Consume `first` and produce the pairs to merge, in order.
    fn synchronize(
        self,
        first: FrameStream<'_>,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<Vec<FramePair>>;
}

/// Synchronization target chosen for two sequence lengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPlan {
    /// Candidate length of the second sequence that produced `target`.
    pub candidate: usize,
    /// Paired length, `lcm(first_len, candidate)`.
    pub target: usize,
    /// Extra cycles applied to the shorter input, `ceil(target / shorter_len) - 1`.
    pub loop_times: usize,
    /// `true` when the first input is the shorter side (ties count as shorter).
    pub first_is_shorter: bool,
}

impl SyncPlan {
    /// Plan synchronization of sequences of `first_len` and `second_len` frames.
    ///
    /// Candidates are the `second_len` integers starting at `minimum_keep`, or at `second_len`
    /// when `minimum_keep` is `None` or zero. The candidate with the smallest
    /// `lcm(first_len, candidate)` wins. Returns `Ok(None)` when either side is empty.
    pub fn new(
        first_len: usize,
        second_len: usize,
        minimum_keep: Option<usize>,
    ) -> LoopsmithResult<Option<Self>> {
        if first_len == 0 || second_len == 0 {
            return Ok(None);
        }
        let start: u64 = match minimum_keep {
            Some(m) if m > 0 => m as u64,
            _ => second_len as u64,
        };
        let window = start..start + second_len as u64;
        let (candidate, target) = min_lcm_candidate(first_len as u64, window).ok_or_else(|| {
            LoopsmithError::contract(
                Stage::Synchronizer,
                format!("no representable lcm for {first_len} frames against {second_len}"),
            )
        })?;

        let first_is_shorter = first_len <= second_len;
        let shorter = first_len.min(second_len) as u64;
        let loop_times = target.div_ceil(shorter).saturating_sub(1);

        Ok(Some(Self {
            candidate: candidate as usize,
            target: target as usize,
            loop_times: loop_times as usize,
            first_is_shorter,
        }))
    }
}

/// Pair `first` and `second` frame-for-frame over a common, loopable length.
///
/// The shorter input is expanded by [`SyncPlan::loop_times`] cycles; the other is cycled only as far
/// as needed, and both are cut at [`SyncPlan::target`] frames, so exactly `target` pairs come out.
/// Either input being empty yields no pairs.
#[tracing::instrument(skip_all, fields(first = first.len(), second = second.len()))]
pub fn synchronize(
    first: Sequence,
    second: Sequence,
    minimum_keep: Option<usize>,
    cancel: &CancellationToken,
) -> LoopsmithResult<Vec<FramePair>> {
    cancel.check(Stage::Synchronizer)?;
    let Some(plan) = SyncPlan::new(first.len(), second.len(), minimum_keep)? else {
        return Ok(Vec::new());
    };
    tracing::debug!(
        candidate = plan.candidate,
        target = plan.target,
        loop_times = plan.loop_times,
        "lcm synchronization planned"
    );

    let cycles_to_cover = |len: usize| plan.target.div_ceil(len).saturating_sub(1);
    let (first_cycles, second_cycles) = if plan.first_is_shorter {
        (plan.loop_times, cycles_to_cover(second.len()))
    } else {
        (cycles_to_cover(first.len()), plan.loop_times)
    };

    let lhs = loop_frames(first, first_cycles).take(plan.target);
    let rhs = loop_frames(second, second_cycles).take(plan.target);

    let mut pairs = Vec::with_capacity(plan.target);
    for (a, b) in lhs.zip(rhs) {
        cancel.check(Stage::Synchronizer)?;
        pairs.push((a?, b?));
    }
    Ok(pairs)
}

/// [`Synchronizer`] that pairs a stream with an owned second sequence by LCM expansion.
#[derive(Debug)]
pub struct LcmSynchronizer {
    second: Sequence,
    minimum_keep: Option<usize>,
}

impl LcmSynchronizer {
    /// Synchronize against `second` with its natural length as the minimum.
    pub fn new(second: Sequence) -> Self {
        Self {
            second,
            minimum_keep: None,
        }
    }

    /// Start the candidate window at `minimum_keep` instead (`0` keeps the default).
    pub fn with_minimum(mut self, minimum_keep: usize) -> Self {
        self.minimum_keep = Some(minimum_keep);
        self
    }
}

impl Synchronizer for LcmSynchronizer {
    fn synchronize(
        self,
        first: FrameStream<'_>,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<Vec<FramePair>> {
        let first = first.collect_sequence(cancel)?;
        synchronize(first, self.second, self.minimum_keep, cancel)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/sync.rs"]
mod tests;
