use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat};

use crate::foundation::core::Frame;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::render::stream::FrameStream;

/// Decode an encoded image into frames.
///
/// GIF animations are decoded lazily, one composited canvas per frame, indexed from 0. Any other
/// format `image` understands becomes a single frame at index 0.
pub fn decode_frames<'a>(bytes: Vec<u8>) -> LoopsmithResult<FrameStream<'a>> {
    let format =
        image::guess_format(&bytes).map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
    if format != ImageFormat::Gif {
        let img = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
        return Ok(FrameStream::from_frames([Frame::new(0, img.to_rgba8())]));
    }

    let decoder = GifDecoder::new(Cursor::new(bytes))
        .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
    let frames = decoder.into_frames().enumerate().map(|(i, frame)| {
        let frame = frame.map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
        Ok(Frame::new(i as u32, frame.into_buffer()))
    });
    Ok(FrameStream::new(frames))
}

/// Like [`decode_frames`], reading the file at `path`.
pub fn open_frames<'a>(path: impl AsRef<Path>) -> LoopsmithResult<FrameStream<'a>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read '{}'", path.display()))
        .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
    decode_frames(bytes)
}

/// Stream every file in `dir` whose extension matches `extension` (case-insensitive).
///
/// Files are ordered lexicographically by name and decoded only when pulled, with indices from 1.
#[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display(), extension = extension))]
pub fn load_dir<'a>(dir: impl AsRef<Path>, extension: &str) -> LoopsmithResult<FrameStream<'a>> {
    let dir = dir.as_ref();
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list frame directory '{}'", dir.display()))
        .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read an entry of '{}'", dir.display()))
            .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&wanted));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    tracing::debug!(files = paths.len(), "frame directory listed");

    let frames = paths.into_iter().zip(1u32..).map(|(path, index)| {
        let img = image::open(&path)
            .with_context(|| format!("failed to decode '{}'", path.display()))
            .map_err(|e| LoopsmithError::upstream(Stage::Source, e))?;
        Ok(Frame::new(index, img.to_rgba8()))
    });
    Ok(FrameStream::new(frames))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
