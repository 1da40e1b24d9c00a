use super::*;
use image::Rgba;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn premultiply_round_trips_opaque_and_clears_transparent() {
    assert_eq!(unpremultiply(premultiply([12, 34, 56, 255])), [12, 34, 56, 255]);
    assert_eq!(premultiply([12, 34, 56, 0]), [0, 0, 0, 0]);
    assert_eq!(premultiply([255, 0, 0, 128]), [128, 0, 0, 128]);
}

#[test]
fn draw_over_clips_negative_offsets() {
    let mut dst = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
    let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
    draw_over(&mut dst, &src, -1, -1, 1.0);
    assert_eq!(dst.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(dst.get_pixel(1, 0).0, [0, 0, 0, 255]);
    assert_eq!(dst.get_pixel(0, 1).0, [0, 0, 0, 255]);
}

#[test]
fn draw_over_fully_outside_is_noop() {
    let mut dst = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
    let src = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
    draw_over(&mut dst, &src, 5, 0, 1.0);
    draw_over(&mut dst, &src, 0, -2, 1.0);
    assert!(dst.pixels().all(|p| p.0 == [9, 9, 9, 255]));
}

#[test]
fn draw_over_blends_onto_transparent_canvas() {
    let mut dst = RgbaImage::new(1, 1);
    let src = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
    draw_over(&mut dst, &src, 0, 0, 1.0);
    assert_eq!(dst.get_pixel(0, 0).0, [200, 100, 50, 255]);
}
