//! Foreground matting over a caller-supplied segmentation model.
//!
//! The crate ships no inference runtime. A [`MaskModel`] turns a frame into a grayscale mask and
//! [`FrameStream::apply_matting`] multiplies each frame's alpha by it. [`MattingConfig`] carries
//! the usual model metadata plus helpers to build the normalized input tensor and to read a
//! float mask back.

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::foundation::cancel::CancellationToken;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::foundation::math::mul_div255_u8;
use crate::render::stream::FrameStream;

/// Produces a foreground mask for an image; `255` keeps a pixel, `0` clears it.
///
/// The mask may be any size; it is stretched to the frame before use.
pub trait MaskModel {
    fn infer(&mut self, image: &RgbaImage) -> LoopsmithResult<GrayImage>;
}

impl<F> MaskModel for F
where
    F: FnMut(&RgbaImage) -> LoopsmithResult<GrayImage>,
{
    fn infer(&mut self, image: &RgbaImage) -> LoopsmithResult<GrayImage> {
        self(image)
    }
}

/// Model metadata: where the weights live and how inputs are normalized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MattingConfig {
    pub model_path: PathBuf,
    /// `(width, height)` the model expects.
    pub input_size: (u32, u32),
    /// Per-channel RGB mean, on the `0..=1` scale.
    pub mean: [f32; 3],
    /// Per-channel RGB standard deviation, on the `0..=1` scale.
    pub std: [f32; 3],
}

impl Default for MattingConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            input_size: (512, 512),
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        }
    }
}

impl MattingConfig {
    pub fn validate(&self) -> LoopsmithResult<()> {
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "matting input_size must be non-zero",
            ));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                "matting std must be finite and non-zero",
            ));
        }
        Ok(())
    }

    /// Planar `1 x 3 x H x W` tensor of `image` resized to `input_size`, normalized per channel.
    pub fn normalize(&self, image: &RgbaImage) -> LoopsmithResult<Vec<f32>> {
        self.validate()?;
        let (w, h) = self.input_size;
        let resized = imageops::resize(image, w, h, FilterType::Triangle);
        let plane = (w * h) as usize;
        let mut tensor = vec![0f32; plane * 3];
        for (i, px) in resized.pixels().enumerate() {
            for c in 0..3 {
                let v = f32::from(px.0[c]) / 255.0;
                tensor[c * plane + i] = (v - self.mean[c]) / self.std[c];
            }
        }
        Ok(tensor)
    }

    /// Turn a `H x W` float mask at `input_size` into a grayscale mask of `target` size.
    pub fn mask_from_tensor(
        &self,
        values: &[f32],
        target: (u32, u32),
    ) -> LoopsmithResult<GrayImage> {
        self.validate()?;
        let (w, h) = self.input_size;
        if values.len() != (w * h) as usize {
            return Err(LoopsmithError::contract(
                Stage::Transform,
                format!("mask tensor has {} values, expected {}x{}", values.len(), w, h),
            ));
        }
        let mask = GrayImage::from_fn(w, h, |x, y| {
            let v = values[(y * w + x) as usize];
            Luma([(v.clamp(0.0, 1.0) * 255.0).round() as u8])
        });
        Ok(fit_mask(mask, target))
    }
}

/// Multiply the alpha of `image` by `mask`, stretching the mask when sizes differ.
pub fn apply_mask(image: &mut RgbaImage, mask: &GrayImage) {
    let stretched;
    let mask = if mask.dimensions() == image.dimensions() {
        mask
    } else {
        stretched = fit_mask(mask.clone(), image.dimensions());
        &stretched
    };
    for (px, m) in image.pixels_mut().zip(mask.pixels()) {
        px.0[3] = mul_div255_u8(u16::from(px.0[3]), u16::from(m.0[0]));
    }
}

fn fit_mask(mask: GrayImage, (w, h): (u32, u32)) -> GrayImage {
    if mask.dimensions() == (w, h) {
        return mask;
    }
    imageops::resize(&mask, w, h, FilterType::Triangle)
}

impl<'a> FrameStream<'a> {
    /// Cut every frame out with `model`.
    ///
    /// One model serves the whole stream, so inference runs in order on the pulling thread.
    pub fn apply_matting<M>(self, model: M, cancel: &CancellationToken) -> FrameStream<'a>
    where
        M: MaskModel + 'a,
    {
        let cancel = cancel.clone();
        let mut model = model;
        let mut upstream = self;
        FrameStream::new(std::iter::from_fn(move || {
            if let Err(e) = cancel.check(Stage::Transform) {
                return Some(Err(e));
            }
            let mut frame = match upstream.next()? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(e)),
            };
            let mask = match model.infer(frame.image()) {
                Ok(mask) => mask,
                Err(e) => return Some(Err(e)),
            };
            if let Err(e) = frame.mutate(|img| apply_mask(img, &mask)) {
                return Some(Err(e));
            }
            Some(Ok(frame))
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/matting.rs"]
mod tests;
