use super::*;
use crate::foundation::core::{BufferLedger, Sequence};
use image::Rgba;
use proptest::prelude::*;

fn columns(index: u32, width: u32) -> Frame {
    Frame::new(
        index,
        RgbaImage::from_fn(width, 1, |x, _| Rgba([x as u8 * 10, 0, 0, 255])),
    )
}

fn column_reds(frame: &Frame) -> Vec<u8> {
    (0..frame.width())
        .map(|x| frame.image().get_pixel(x, 0).0[0])
        .collect()
}

fn slide_all(frames: Vec<Frame>, options: &SlideOptions) -> Vec<Frame> {
    FrameStream::from_frames(frames)
        .slide(options, &CancellationToken::new())
        .unwrap()
        .map(|f| f.unwrap())
        .collect()
}

#[test]
fn period_comes_from_the_cheapest_nearby_move_count() {
    assert_eq!(SlidePlan::new(3, 16).unwrap(), SlidePlan { period: 15, target: 15 });
    assert_eq!(SlidePlan::new(4, 16).unwrap(), SlidePlan { period: 16, target: 16 });
    assert_eq!(SlidePlan::new(5, 16).unwrap(), SlidePlan { period: 15, target: 15 });
}

#[test]
fn offsets_advance_by_whole_canvas_fractions() {
    let plan = SlidePlan { period: 4, target: 8 };
    assert_eq!(plan.offset(0, 1, 1, 8, 4), (0, 0));
    assert_eq!(plan.offset(1, 1, 1, 8, 4), (2, 1));
    assert_eq!(plan.offset(3, -1, 0, 8, 4), (-6, 0));
    assert_eq!(plan.offset(4, 1, 1, 8, 4), (0, 0));
}

#[test]
fn slide_right_wraps_the_leading_edge() {
    let opts = SlideOptions {
        horizontal: 1,
        vertical: 0,
        total_moves: 4,
    };
    // 3 frames against 2..=5: lcm 6, 3, 12, 15 -> period 3.
    let out = slide_all((1..=3).map(|i| columns(i, 3)).collect(), &opts);
    assert_eq!(out.len(), 3);
    assert_eq!(column_reds(&out[0]), vec![0, 10, 20]);
    assert_eq!(column_reds(&out[1]), vec![20, 0, 10]);
    assert_eq!(column_reds(&out[2]), vec![10, 20, 0]);
}

#[test]
fn slide_left_runs_the_other_way() {
    let opts = SlideOptions {
        horizontal: -1,
        vertical: 0,
        total_moves: 4,
    };
    let out = slide_all((1..=3).map(|i| columns(i, 3)).collect(), &opts);
    assert_eq!(column_reds(&out[1]), vec![10, 20, 0]);
    assert_eq!(column_reds(&out[2]), vec![20, 0, 10]);
}

#[test]
fn diagonal_slide_fills_the_whole_canvas() {
    let opts = SlideOptions {
        horizontal: 1,
        vertical: 1,
        total_moves: 4,
    };
    let out = slide_all(
        (1..=4)
            .map(|i| Frame::new(i, RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]))))
            .collect(),
        &opts,
    );
    assert!(!out.is_empty());
    for f in &out {
        assert_eq!(f.dimensions(), (4, 4));
        assert!(f.image().pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }
}

#[test]
fn output_is_a_whole_number_of_periods_with_contiguous_indices() {
    let out = slide_all((1..=5).map(|i| columns(i, 6)).collect(), &SlideOptions::default());
    let idx: Vec<u32> = out.iter().map(|f| f.index).collect();
    assert_eq!(idx, (1..=15).collect::<Vec<_>>());
    // The first frame of every period is the unshifted source.
    assert_eq!(column_reds(&out[0]), column_reds(&columns(1, 6)));
}

fn solid_red(index: u32, red: u8, width: u32) -> Frame {
    Frame::new(index, RgbaImage::from_pixel(width, 1, Rgba([red, 0, 0, 255])))
}

#[test]
fn leading_copy_runs_half_a_period_ahead() {
    let opts = SlideOptions {
        horizontal: 1,
        vertical: 0,
        total_moves: 5,
    };
    // 4 frames against 3..=6: lcm 12, 4, 20, 12 -> period 4, half period 2.
    let reds = [10, 60, 110, 160];
    let source = (0..4).map(|i| solid_red(i as u32 + 1, reds[i], 8)).collect();
    let out = slide_all(source, &opts);
    assert_eq!(out.len(), 4);
    assert_eq!(column_reds(&out[0]), vec![10; 8]);
    // Frame 1 is shifted by 2 columns: the leading copy is source frame 3.
    assert_eq!(column_reds(&out[1]), vec![160, 160, 60, 60, 60, 60, 60, 60]);
    // Frame 2 is shifted by 4 columns: the leading copy wraps to source frame 0.
    assert_eq!(column_reds(&out[2]), vec![10, 10, 10, 10, 110, 110, 110, 110]);
}

#[test]
fn odd_lengths_fold_without_a_closing_frame() {
    let opts = SlideOptions {
        horizontal: -1,
        vertical: 0,
        total_moves: 4,
    };
    // 3 frames against 2..=5 -> period 3, target 3; every frame is paired by the fold.
    let out = slide_all((0..3).map(|i| solid_red(i + 1, 50 * i as u8, 3)).collect(), &opts);
    let idx: Vec<u32> = out.iter().map(|f| f.index).collect();
    assert_eq!(idx, vec![1, 2, 3]);
    // Frame 1 slides left by 1: trailing source 1 in columns 0..2, leading source 2 in column 2.
    assert_eq!(column_reds(&out[1]), vec![50, 50, 100]);
    // Frame 2 slides left by 2: the leading copy folds back to source 0.
    assert_eq!(column_reds(&out[2]), vec![100, 0, 0]);
}

#[test]
fn bad_directions_are_rejected() {
    let err = FrameStream::from_frames([columns(1, 2)])
        .slide(&SlideOptions::new(0, 0), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, LoopsmithError::ContractViolation { .. }));
    assert!(
        FrameStream::from_frames([columns(1, 2)])
            .slide(&SlideOptions::new(3, 0), &CancellationToken::new())
            .is_err()
    );
}

#[test]
fn empty_input_slides_to_nothing() {
    let out = FrameStream::empty()
        .slide(&SlideOptions::default(), &CancellationToken::new())
        .unwrap();
    assert_eq!(out.count(), 0);
}

#[test]
fn cancelled_slide_releases_buffers() {
    let ledger = BufferLedger::new();
    let cancel = CancellationToken::new();
    let source: Sequence = (1..=3)
        .map(|i| Frame::tracked(i, RgbaImage::new(2, 2), &ledger))
        .collect();
    let mut out = FrameStream::from(source)
        .slide(&SlideOptions::default(), &cancel)
        .unwrap();
    let first = out.next().unwrap().unwrap();
    cancel.cancel();
    assert!(out.next().unwrap().unwrap_err().is_cancelled());
    assert!(out.next().is_none());
    drop(out);
    assert_eq!(ledger.live(), 1);
    drop(first);
    assert_eq!(ledger.live(), 0);
}

proptest! {
    #[test]
    fn target_is_divisible_by_length_and_period(len in 1usize..50, moves in 1u32..50) {
        let plan = SlidePlan::new(len, moves).unwrap();
        prop_assert_eq!(plan.target % len, 0);
        prop_assert_eq!(plan.target % plan.period, 0);
        prop_assert!(plan.period as u32 >= moves.saturating_sub(2).max(1));
        prop_assert!(plan.period as u32 <= moves + 1);
    }
}
