use super::*;
use crate::foundation::core::{BufferLedger, Frame};
use image::Rgba;

fn left_half_mask(image: &RgbaImage) -> LoopsmithResult<GrayImage> {
    let w = image.width();
    Ok(GrayImage::from_fn(w, image.height(), |x, _| {
        Luma([if x < w / 2 { 255 } else { 0 }])
    }))
}

#[test]
fn mask_clears_background_alpha() {
    let frames =
        (1..=3).map(|i| Frame::new(i, RgbaImage::from_pixel(4, 2, Rgba([9, 9, 9, 255]))));
    let out: Vec<Frame> = FrameStream::from_frames(frames)
        .apply_matting(left_half_mask, &CancellationToken::new())
        .map(|f| f.unwrap())
        .collect();
    assert_eq!(out.len(), 3);
    for f in &out {
        assert_eq!(f.image().get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(f.image().get_pixel(3, 1).0[3], 0);
    }
}

#[test]
fn small_masks_are_stretched() {
    let mut image = RgbaImage::from_pixel(4, 4, Rgba([1, 1, 1, 255]));
    apply_mask(&mut image, &GrayImage::from_pixel(1, 1, Luma([0])));
    assert!(image.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn partial_mask_scales_alpha() {
    let mut image = RgbaImage::from_pixel(1, 1, Rgba([1, 1, 1, 200]));
    apply_mask(&mut image, &GrayImage::from_pixel(1, 1, Luma([128])));
    assert_eq!(image.get_pixel(0, 0).0[3], 100);
}

#[test]
fn model_state_persists_across_frames() {
    let mut calls = 0u32;
    let counting = |image: &RgbaImage| -> LoopsmithResult<GrayImage> {
        calls += 1;
        Ok(GrayImage::from_pixel(image.width(), image.height(), Luma([255])))
    };
    let n = FrameStream::from_frames((1..=5).map(|i| Frame::new(i, RgbaImage::new(2, 2))))
        .apply_matting(counting, &CancellationToken::new())
        .count();
    assert_eq!(n, 5);
    assert_eq!(calls, 5);
}

#[test]
fn inference_failure_stops_the_stream() {
    let ledger = BufferLedger::new();
    let failing = |_: &RgbaImage| -> LoopsmithResult<GrayImage> {
        Err(LoopsmithError::upstream(Stage::Transform, "model crashed"))
    };
    let input: Vec<Frame> = (1..=3)
        .map(|i| Frame::tracked(i, RgbaImage::new(2, 2), &ledger))
        .collect();
    let mut stream =
        FrameStream::from_frames(input).apply_matting(failing, &CancellationToken::new());
    assert!(matches!(
        stream.next().unwrap().unwrap_err(),
        LoopsmithError::Upstream { .. }
    ));
    assert!(stream.next().is_none());
    drop(stream);
    assert_eq!(ledger.live(), 0);
}

#[test]
fn normalize_builds_planar_tensor() {
    let cfg = MattingConfig {
        input_size: (2, 1),
        ..MattingConfig::default()
    };
    let image = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 255, 255]));
    let tensor = cfg.normalize(&image).unwrap();
    assert_eq!(tensor.len(), 6);
    assert_eq!(&tensor[0..2], &[1.0, 1.0]);
    assert_eq!(&tensor[2..4], &[-1.0, -1.0]);
    assert_eq!(&tensor[4..6], &[1.0, 1.0]);
}

#[test]
fn mask_from_tensor_checks_length_and_resizes() {
    let cfg = MattingConfig {
        input_size: (2, 2),
        ..MattingConfig::default()
    };
    assert!(cfg.mask_from_tensor(&[0.0; 3], (2, 2)).is_err());
    let mask = cfg.mask_from_tensor(&[1.0, 0.0, 1.5, -1.0], (2, 2)).unwrap();
    assert_eq!(mask.as_raw(), &vec![255, 0, 255, 0]);
    let big = cfg.mask_from_tensor(&[1.0; 4], (8, 6)).unwrap();
    assert_eq!(big.dimensions(), (8, 6));
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = MattingConfig {
        std: [0.5, 0.0, 0.5],
        ..MattingConfig::default()
    };
    assert!(cfg.validate().is_err());
    let cfg = MattingConfig {
        input_size: (0, 4),
        ..MattingConfig::default()
    };
    assert!(cfg.normalize(&RgbaImage::new(1, 1)).is_err());
}
