use std::collections::VecDeque;

use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::{Frame, Sequence};
use crate::foundation::error::{LoopsmithResult, Stage};
use crate::render::stream::FrameStream;

/// Repeat `source` for `extra_cycles` additional full cycles.
///
/// The first pass moves the original frames out, re-stamped from index 1. Every extra pass yields
/// fresh deep copies with continuing indices, so the stream holds `len * (extra_cycles + 1)`
/// frames and no two of them share a buffer. Copies are made lazily as the stream is pulled.
pub fn loop_frames<'a>(source: Sequence, extra_cycles: usize) -> FrameStream<'a> {
    FrameStream::new(Looped::new(source, extra_cycles).map(Ok))
}

/// Follow every frame with `times` deep copies of itself, re-stamping indices from 1.
pub fn duplicate_frames<'a>(stream: FrameStream<'a>, times: usize) -> FrameStream<'a> {
    let mut next_index = 1u32;
    let mut pending: VecDeque<Frame> = VecDeque::new();
    let mut upstream = stream;
    FrameStream::new(std::iter::from_fn(move || {
        if let Some(frame) = pending.pop_front() {
            return Some(Ok(frame));
        }
        let frame = match upstream.next()? {
            Ok(frame) => frame.with_index(next_index),
            Err(e) => return Some(Err(e)),
        };
        next_index += 1;
        for _ in 0..times {
            pending.push_back(frame.deep_copy(next_index));
            next_index += 1;
        }
        Some(Ok(frame))
    }))
}

impl<'a> FrameStream<'a> {
    /// Materialize the stream and expand it by `extra_cycles` (see [`loop_frames`]).
    pub fn loop_cycles(
        self,
        extra_cycles: usize,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<FrameStream<'a>> {
        let seq = self.collect_sequence(cancel)?;
        Ok(loop_frames(seq, extra_cycles).cancellable(cancel, Stage::Expander))
    }

    /// Duplicate each frame `times` extra times (see [`duplicate_frames`]).
    pub fn duplicate_frames(self, times: usize) -> FrameStream<'a> {
        duplicate_frames(self, times)
    }
}

struct Looped {
    first_pass: std::vec::IntoIter<Frame>,
    cache: Vec<Frame>,
    last_pass: Option<std::vec::IntoIter<Frame>>,
    cycles_left: usize,
    cursor: usize,
    next_index: u32,
}

impl Looped {
    fn new(source: Sequence, extra_cycles: usize) -> Self {
        let frames = source.into_frames();
        let extra_cycles = if frames.is_empty() { 0 } else { extra_cycles };
        Self {
            cache: Vec::with_capacity(if extra_cycles > 0 { frames.len() } else { 0 }),
            first_pass: frames.into_iter(),
            last_pass: None,
            cycles_left: extra_cycles,
            cursor: 0,
            next_index: 1,
        }
    }

    fn stamp(&mut self, frame: Frame) -> Frame {
        let index = self.next_index;
        self.next_index += 1;
        frame.with_index(index)
    }
}

impl Iterator for Looped {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if let Some(frame) = self.first_pass.next() {
            if self.cycles_left > 0 {
                self.cache.push(frame.deep_copy(0));
            }
            return Some(self.stamp(frame));
        }

        // Middle passes copy from the cache; the last pass hands the cached copies out.
        while self.cycles_left > 1 {
            if let Some(cached) = self.cache.get(self.cursor) {
                let copy = cached.deep_copy(self.next_index);
                self.next_index += 1;
                self.cursor += 1;
                return Some(copy);
            }
            self.cursor = 0;
            self.cycles_left -= 1;
        }

        if self.cycles_left == 1 {
            self.cycles_left = 0;
            self.last_pass = Some(std::mem::take(&mut self.cache).into_iter());
        }
        let frame = self.last_pass.as_mut()?.next()?;
        Some(self.stamp(frame))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let per_cycle = self.first_pass.len() + self.cache.len();
        let remaining = self.first_pass.len()
            + self.cycles_left.saturating_sub(1) * per_cycle
            + if self.cycles_left > 0 {
                per_cycle.saturating_sub(self.cursor)
            } else {
                0
            }
            + self.last_pass.as_ref().map_or(0, |p| p.len());
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/expand.rs"]
mod tests;
