use image::RgbaImage;
use rayon::prelude::*;

use crate::config::RadialBlurOptions;
use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::Frame;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::render::pipeline::FrameProcessor;

/// Zoom-style blur: every pixel averages samples taken along its ray towards the center.
#[derive(Clone, Debug)]
pub struct RadialBlur {
    center: Option<(u32, u32)>,
    iterations: u32,
}

impl RadialBlur {
    pub fn new(options: &RadialBlurOptions) -> LoopsmithResult<Self> {
        options.validate()?;
        Ok(Self {
            center: options.center,
            iterations: options.iterations,
        })
    }

    /// Blur `src` into a new buffer of the same size.
    pub fn apply(&self, src: &RgbaImage) -> LoopsmithResult<RgbaImage> {
        if self.iterations == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "radial blur iterations must be >= 1",
            ));
        }
        let (width, height) = src.dimensions();
        if width == 0 || height == 0 {
            return Ok(src.clone());
        }
        let (cx, cy) = self.center.unwrap_or((width / 2, height / 2));
        let (cx, cy) = (cx as f32, cy as f32);
        let iterations = self.iterations;
        let row_len = width as usize * 4;

        let mut out = vec![0u8; src.as_raw().len()];
        out.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let dy = y as f32 - cy;
                for x in 0..width {
                    let dx = x as f32 - cx;
                    let r = (dx * dx + dy * dy).sqrt();
                    let (sin, cos) = dy.atan2(dx).sin_cos();

                    let mut acc = [0f32; 4];
                    for m in 0..iterations {
                        let t = (r - m as f32).max(0.0);
                        let sx = ((t * cos + cx) as i64).clamp(0, i64::from(width) - 1);
                        let sy = ((t * sin + cy) as i64).clamp(0, i64::from(height) - 1);
                        let px = src.get_pixel(sx as u32, sy as u32).0;
                        for c in 0..4 {
                            acc[c] += f32::from(px[c]);
                        }
                    }

                    let base = x as usize * 4;
                    for c in 0..4 {
                        let mean = acc[c] / iterations as f32;
                        row[base + c] = mean.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });

        RgbaImage::from_raw(width, height, out).ok_or_else(|| {
            LoopsmithError::contract(Stage::Transform, "radial blur buffer size mismatch")
        })
    }
}

impl FrameProcessor for RadialBlur {
    fn process(&self, frame: Frame, cancel: &CancellationToken) -> LoopsmithResult<Frame> {
        cancel.check(Stage::Transform)?;
        let blurred = self.apply(frame.image())?;
        Ok(frame.replace_image(blurred))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/radial_blur.rs"]
mod tests;
