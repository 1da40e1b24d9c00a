use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};

pub use image::{GrayImage, RgbaImage};

/// Counts frame buffers that are still alive.
///
/// Frames built with [`Frame::tracked`] hold a lease on the ledger. Deep copies renew the lease and
/// dropping a frame releases it, so `live() == 0` once every tracked buffer is gone.
#[derive(Clone, Debug, Default)]
pub struct BufferLedger {
    live: Arc<AtomicUsize>,
    issued: Arc<AtomicUsize>,
}

impl BufferLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked buffers currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of leases issued since creation.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    fn lease(&self) -> BufferLease {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.issued.fetch_add(1, Ordering::SeqCst);
        BufferLease {
            ledger: self.clone(),
        }
    }
}

/// One live buffer registered on a [`BufferLedger`]; released on drop.
#[derive(Debug)]
pub struct BufferLease {
    ledger: BufferLedger,
}

impl BufferLease {
    fn renew(&self) -> Self {
        self.ledger.lease()
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One animation frame: an owned straight-alpha RGBA8 buffer and its position in a sequence.
///
/// `Frame` is not `Clone`; use [`Frame::deep_copy`] to get an independent buffer.
pub struct Frame {
    /// Position of the frame in its sequence.
    pub index: u32,
    image: RgbaImage,
    lease: Option<BufferLease>,
}

impl Frame {
    /// Wrap `image` as the frame at `index`.
    pub fn new(index: u32, image: RgbaImage) -> Self {
        Self {
            index,
            image,
            lease: None,
        }
    }

    /// Like [`Frame::new`], registering the buffer on `ledger`.
    pub fn tracked(index: u32, image: RgbaImage, ledger: &BufferLedger) -> Self {
        Self {
            index,
            image,
            lease: Some(ledger.lease()),
        }
    }

    /// Borrow the pixel buffer.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` of the buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Mutate the buffer in place.
    ///
    /// The closure must not change the buffer dimensions; size-changing transforms build a new
    /// buffer and go through [`Frame::replace_image`].
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut RgbaImage) -> R) -> LoopsmithResult<R> {
        let before = self.image.dimensions();
        let out = f(&mut self.image);
        let after = self.image.dimensions();
        if before != after {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                format!(
                    "frame {} was resized in place from {}x{} to {}x{}",
                    self.index, before.0, before.1, after.0, after.1
                ),
            ));
        }
        Ok(out)
    }

    /// Consume the frame and return one at the same index that owns `image`.
    ///
    /// The previous buffer is released immediately.
    pub fn replace_image(mut self, image: RgbaImage) -> Self {
        self.image = image;
        self
    }

    /// Consume the frame and return it re-stamped at `index`.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Independent copy of this frame's buffer at `index`.
    pub fn deep_copy(&self, index: u32) -> Self {
        Self {
            index,
            image: self.image.clone(),
            lease: self.lease.as_ref().map(BufferLease::renew),
        }
    }

    /// New frame at `index` owning `image`, tracked on the same ledger as `self`.
    pub(crate) fn derive(&self, index: u32, image: RgbaImage) -> Self {
        Self {
            index,
            image,
            lease: self.lease.as_ref().map(BufferLease::renew),
        }
    }

    /// Consume the frame, keeping only its buffer.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("tracked", &self.lease.is_some())
            .finish()
    }
}

/// Owned, ordered collection of frames.
///
/// Dropping a sequence drops every frame it holds.
#[derive(Debug, Default)]
pub struct Sequence {
    frames: Vec<Frame>,
}

impl Sequence {
    /// Build a sequence from frames in order.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when the sequence holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// First frame, if any.
    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Iterate frames in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Append a frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Re-stamp indices to be contiguous from `start`.
    pub fn restamp(&mut self, start: u32) {
        for (offset, frame) in self.frames.iter_mut().enumerate() {
            frame.index = start + offset as u32;
        }
    }

    /// Return `true` when indices are strictly ascending.
    pub fn is_ascending(&self) -> bool {
        self.frames.windows(2).all(|w| w[0].index < w[1].index)
    }

    /// Consume the sequence, returning its frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl From<Vec<Frame>> for Sequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl FromIterator<Frame> for Sequence {
    fn from_iter<T: IntoIterator<Item = Frame>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Sequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
