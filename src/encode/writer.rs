use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::config::EncodeOptions;
use crate::encode::meme::{Animation, Disposal, Meme, MemeFormat, Repeat};
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::foundation::math::mul_div255_u16;

/// Write `meme` to `writer` as `format`.
///
/// Stills encode as PNG or single-frame GIF; animations only as GIF. Opaque GIF frames are
/// flattened over `options.background_rgba` before quantization.
pub fn encode_meme<W: Write>(
    meme: &Meme,
    format: MemeFormat,
    writer: W,
    options: &EncodeOptions,
) -> LoopsmithResult<()> {
    options.validate()?;
    match (meme, format) {
        (Meme::Still(img), MemeFormat::Png) => encode_png(img, writer),
        (Meme::Still(img), MemeFormat::Gif) => {
            let (w, h) = gif_dimensions(img.width(), img.height())?;
            let mut encoder = gif::Encoder::new(writer, w, h, &[])
                .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
            let frame = gif_frame(img, false, options)?;
            encoder
                .write_frame(&frame)
                .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
            finish_gif(encoder)
        }
        (Meme::Animation(anim), MemeFormat::Gif) => encode_gif(anim, writer, options),
        (Meme::Animation(_), MemeFormat::Png) => Err(LoopsmithError::contract(
            Stage::Encode,
            "animations can only be encoded as GIF",
        )),
    }
}

impl Meme {
    /// Encode in [`Meme::format`] into a byte buffer.
    pub fn to_bytes(&self, options: &EncodeOptions) -> LoopsmithResult<Vec<u8>> {
        let mut out = Vec::new();
        encode_meme(self, self.format(), &mut out, options)?;
        Ok(out)
    }

    /// Encode in [`Meme::format`] to `path`, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>, options: &EncodeOptions) -> LoopsmithResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| {
                    format!("failed to create output directory '{}'", parent.display())
                })
                .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create '{}'", path.display()))
            .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
        let mut writer = BufWriter::new(file);
        encode_meme(self, self.format(), &mut writer, options)?;
        writer
            .flush()
            .with_context(|| format!("failed to flush '{}'", path.display()))
            .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
        Ok(())
    }
}

fn encode_png<W: Write>(img: &RgbaImage, writer: W) -> LoopsmithResult<()> {
    PngEncoder::new(writer)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))
}

fn encode_gif<W: Write>(
    anim: &Animation,
    writer: W,
    options: &EncodeOptions,
) -> LoopsmithResult<()> {
    let (w, h) = gif_dimensions(anim.width, anim.height)?;
    let mut encoder = gif::Encoder::new(writer, w, h, &[])
        .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
    let repeat = match anim.repeat {
        Repeat::Infinite => gif::Repeat::Infinite,
        Repeat::Finite(n) => gif::Repeat::Finite(n),
    };
    encoder
        .set_repeat(repeat)
        .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;

    for (i, f) in anim.frames.iter().enumerate() {
        if f.image.dimensions() != (anim.width, anim.height) {
            return Err(LoopsmithError::contract(
                Stage::Encode,
                format!(
                    "animation frame {i} is {}x{}, canvas is {}x{}",
                    f.image.width(),
                    f.image.height(),
                    anim.width,
                    anim.height
                ),
            ));
        }
        let mut frame = gif_frame(&f.image, f.transparent, options)?;
        frame.delay = f.delay_cs;
        frame.dispose = match f.disposal {
            Disposal::Keep => gif::DisposalMethod::Keep,
            Disposal::Background => gif::DisposalMethod::Background,
            Disposal::Previous => gif::DisposalMethod::Previous,
        };
        encoder
            .write_frame(&frame)
            .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
    }
    finish_gif(encoder)
}

fn gif_frame(
    img: &RgbaImage,
    transparent: bool,
    options: &EncodeOptions,
) -> LoopsmithResult<gif::Frame<'static>> {
    let (w, h) = gif_dimensions(img.width(), img.height())?;
    if transparent {
        let mut rgba = img.as_raw().clone();
        return Ok(gif::Frame::from_rgba_speed(w, h, &mut rgba, options.gif_speed));
    }
    let rgb = flatten_to_opaque_rgb8(img, options.background_rgba);
    Ok(gif::Frame::from_rgb_speed(w, h, &rgb, options.gif_speed))
}

fn finish_gif<W: Write>(encoder: gif::Encoder<W>) -> LoopsmithResult<()> {
    encoder
        .into_inner()
        .map_err(|e| LoopsmithError::upstream(Stage::Encode, e))?;
    Ok(())
}

fn gif_dimensions(width: u32, height: u32) -> LoopsmithResult<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(LoopsmithError::contract(
            Stage::Encode,
            format!("GIF canvas must be 1..=65535 pixels per side (got {width}x{height})"),
        )),
    }
}

/// Composite straight-alpha RGBA over an opaque background color, dropping alpha.
pub(crate) fn flatten_to_opaque_rgb8(img: &RgbaImage, bg_rgba: [u8; 4]) -> Vec<u8> {
    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    let mut out = Vec::with_capacity(img.as_raw().len() / 4 * 3);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        if a == 255 {
            out.extend_from_slice(&[r, g, b]);
            continue;
        }
        let a = u16::from(a);
        let inv = 255u16 - a;
        for (c, bg_c) in [r, g, b].into_iter().zip(bg) {
            let v = mul_div255_u16(u16::from(c), a) + mul_div255_u16(bg_c, inv);
            out.push(v.min(255) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/writer.rs"]
mod tests;
