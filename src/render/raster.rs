use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Affine, Point, Rect};

use crate::effects::composite::{PremulRgba8, premultiply, unpremultiply};

// Bounding boxes of right-angle rotations pick up float noise; stay below the next pixel.
const BBOX_EPS: f64 = 1e-6;

/// Resample `src` to `width x height` with a Catmull-Rom filter. Zero sizes are clamped to 1.
pub fn resize(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    imageops::resize(src, width, height, FilterType::CatmullRom)
}

/// Rotate `src` clockwise by `degrees` around its center into a buffer large enough to hold the
/// whole result. Uncovered pixels are transparent.
pub fn rotate_expanded(src: &RgbaImage, degrees: f64) -> RgbaImage {
    let (w, h) = (f64::from(src.width()), f64::from(src.height()));
    let turns = degrees.rem_euclid(360.0);
    if turns == 0.0 {
        return src.clone();
    }

    let center = Point::new(w / 2.0, h / 2.0);
    let forward = Affine::rotate_about(turns.to_radians(), center);
    let bbox = forward.transform_rect_bbox(Rect::new(0.0, 0.0, w, h));
    let out_w = ((bbox.width() - BBOX_EPS).ceil().max(1.0)) as u32;
    let out_h = ((bbox.height() - BBOX_EPS).ceil().max(1.0)) as u32;

    // Center the integer-sized output on the exact bounding box.
    let origin = Point::new(
        bbox.center().x - f64::from(out_w) / 2.0,
        bbox.center().y - f64::from(out_h) / 2.0,
    );
    let inverse = forward.inverse();

    let mut out = RgbaImage::new(out_w, out_h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let p = Point::new(
            origin.x + f64::from(x) + 0.5,
            origin.y + f64::from(y) + 0.5,
        );
        let s = inverse * p;
        px.0 = sample_bilinear(src, s.x, s.y);
    }
    out
}

/// Copy `src` centered onto a transparent `width x height` canvas, clipping whatever overhangs.
pub fn center_on_canvas(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    let x = (i64::from(width) - i64::from(src.width())) / 2;
    let y = (i64::from(height) - i64::from(src.height())) / 2;
    blit(&mut canvas, src, x, y);
    canvas
}

/// Copy `src` into `dst` at `(x, y)` without blending; out-of-bounds parts are clipped.
pub fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width())).min(i64::from(dst.width()));
    let y1 = (y + i64::from(src.height())).min(i64::from(dst.height()));
    for dy in y0..y1 {
        for dx in x0..x1 {
            let px = *src.get_pixel((dx - x) as u32, (dy - y) as u32);
            dst.put_pixel(dx as u32, dy as u32, px);
        }
    }
}

fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> [u8; 4] {
    let px = sx - 0.5;
    let py = sy - 0.5;
    let x0 = px.floor();
    let y0 = py.floor();
    let fx = px - x0;
    let fy = py - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (tx, ty, weight) in taps {
        if weight <= 0.0 {
            continue;
        }
        let texel = texel_premul(src, tx, ty);
        for c in 0..4 {
            acc[c] += f64::from(texel[c]) * weight;
        }
    }

    let premul = acc.map(|v| v.round().clamp(0.0, 255.0) as u8);
    unpremultiply(premul)
}

fn texel_premul(src: &RgbaImage, x: i64, y: i64) -> PremulRgba8 {
    if x < 0 || y < 0 || x >= i64::from(src.width()) || y >= i64::from(src.height()) {
        return [0, 0, 0, 0];
    }
    premultiply(src.get_pixel(x as u32, y as u32).0)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
