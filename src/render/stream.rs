use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::{Frame, Sequence};
use crate::foundation::error::{LoopsmithResult, Stage};

/// Lazy, finite, single-pass producer of frames in ascending index order.
///
/// Streams fuse after yielding an error. Stages that need the whole sequence (cycle expansion,
/// synchronization, rotation, slide, auto-compose) materialize it with
/// [`FrameStream::collect_sequence`].
pub struct FrameStream<'a> {
    inner: Box<dyn Iterator<Item = LoopsmithResult<Frame>> + 'a>,
    failed: bool,
}

impl<'a> FrameStream<'a> {
    /// Wrap a fallible frame iterator.
    pub fn new(iter: impl Iterator<Item = LoopsmithResult<Frame>> + 'a) -> Self {
        Self {
            inner: Box::new(iter),
            failed: false,
        }
    }

    /// Stream that yields nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Stream over already-decoded frames.
    pub fn from_frames(frames: impl IntoIterator<Item = Frame> + 'a) -> Self {
        Self::new(frames.into_iter().map(Ok))
    }

    /// Check `cancel` before every pull, reporting `stage` when it fires.
    pub fn cancellable(self, cancel: &CancellationToken, stage: Stage) -> Self {
        let cancel = cancel.clone();
        let mut upstream = self;
        Self::new(std::iter::from_fn(move || {
            if let Err(e) = cancel.check(stage) {
                return Some(Err(e));
            }
            upstream.next()
        }))
    }

    /// Drain the stream into a [`Sequence`].
    ///
    /// Frames collected before an error or cancellation are dropped with the partial sequence.
    pub fn collect_sequence(self, cancel: &CancellationToken) -> LoopsmithResult<Sequence> {
        let mut seq = Sequence::default();
        for frame in self.cancellable(cancel, Stage::Pipeline) {
            seq.push(frame?);
        }
        Ok(seq)
    }
}

impl From<Sequence> for FrameStream<'_> {
    fn from(seq: Sequence) -> Self {
        Self::from_frames(seq)
    }
}

impl Iterator for FrameStream<'_> {
    type Item = LoopsmithResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}

impl std::fmt::Debug for FrameStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/stream.rs"]
mod tests;
