use super::*;
use crate::foundation::error::LoopsmithError;
use image::RgbaImage;

fn frames(n: u32) -> Vec<Frame> {
    (1..=n).map(|i| Frame::new(i, RgbaImage::new(1, 1))).collect()
}

#[test]
fn collect_sequence_keeps_order() {
    let seq = FrameStream::from_frames(frames(4))
        .collect_sequence(&CancellationToken::new())
        .unwrap();
    let idx: Vec<u32> = seq.iter().map(|f| f.index).collect();
    assert_eq!(idx, vec![1, 2, 3, 4]);
}

#[test]
fn stream_fuses_after_error() {
    let items: Vec<LoopsmithResult<Frame>> = vec![
        Ok(Frame::new(1, RgbaImage::new(1, 1))),
        Err(LoopsmithError::contract(Stage::Source, "bad")),
        Ok(Frame::new(3, RgbaImage::new(1, 1))),
    ];
    let mut s = FrameStream::new(items.into_iter());
    assert!(s.next().unwrap().is_ok());
    assert!(s.next().unwrap().is_err());
    assert!(s.next().is_none());
}

#[test]
fn collect_sequence_observes_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = FrameStream::from_frames(frames(3))
        .collect_sequence(&cancel)
        .unwrap_err();
    assert!(err.is_cancelled());
}
