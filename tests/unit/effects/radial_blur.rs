use super::*;
use crate::config::PipelineOptions;
use crate::render::stream::FrameStream;
use image::Rgba;

fn blur(iterations: u32, center: Option<(u32, u32)>) -> RadialBlur {
    RadialBlur::new(&RadialBlurOptions { center, iterations }).unwrap()
}

#[test]
fn zero_iterations_is_rejected() {
    let err = RadialBlur::new(&RadialBlurOptions {
        center: None,
        iterations: 0,
    })
    .unwrap_err();
    assert!(matches!(err, LoopsmithError::ContractViolation { .. }));
}

#[test]
fn uniform_image_is_unchanged() {
    let src = RgbaImage::from_pixel(9, 7, Rgba([40, 80, 120, 255]));
    assert_eq!(blur(10, None).apply(&src).unwrap(), src);
}

#[test]
fn samples_walk_towards_the_center() {
    // Center defaults to (2, 0); pixel 4 averages itself with pixel 3.
    let mut src = RgbaImage::from_pixel(5, 1, Rgba([0, 0, 0, 255]));
    src.put_pixel(4, 0, Rgba([250, 0, 0, 255]));
    let out = blur(2, None).apply(&src).unwrap();
    assert_eq!(out.get_pixel(4, 0).0, [125, 0, 0, 255]);
    assert_eq!(out.get_pixel(3, 0).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn the_center_pixel_only_samples_itself() {
    let mut src = RgbaImage::from_pixel(5, 5, Rgba([0, 0, 0, 255]));
    src.put_pixel(1, 1, Rgba([200, 200, 200, 255]));
    let out = blur(4, Some((1, 1))).apply(&src).unwrap();
    assert_eq!(out.get_pixel(1, 1).0, [200, 200, 200, 255]);
}

#[test]
fn runs_as_a_parallel_frame_processor() {
    let frames =
        (1..=4).map(|i| Frame::new(i, RgbaImage::from_pixel(6, 6, Rgba([9, 9, 9, 255]))));
    let out: Vec<Frame> = FrameStream::from_frames(frames)
        .for_each(blur(3, None), &PipelineOptions::parallel(), &CancellationToken::new())
        .map(|f| f.unwrap())
        .collect();
    assert_eq!(out.len(), 4);
    assert!(out.iter().all(|f| f.dimensions() == (6, 6)));
}
