use image::RgbaImage;

/// Final artifact of a pipeline: a still image or a looping animation.
#[derive(Clone, Debug, PartialEq)]
pub enum Meme {
    Still(RgbaImage),
    Animation(Animation),
}

impl Meme {
    /// Format the artifact is naturally written in.
    pub fn format(&self) -> MemeFormat {
        match self {
            Meme::Still(_) => MemeFormat::Png,
            Meme::Animation(_) => MemeFormat::Gif,
        }
    }

    /// File extension for [`Meme::format`], without the dot.
    pub fn extension(&self) -> &'static str {
        self.format().extension()
    }

    /// `(width, height)` of the canvas.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Meme::Still(img) => img.dimensions(),
            Meme::Animation(anim) => (anim.width, anim.height),
        }
    }

    /// Number of frames: 1 for a still.
    pub fn frame_count(&self) -> usize {
        match self {
            Meme::Still(_) => 1,
            Meme::Animation(anim) => anim.frames.len(),
        }
    }
}

/// Multi-frame artifact. Every frame shares the canvas size.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub width: u32,
    pub height: u32,
    pub repeat: Repeat,
    pub frames: Vec<AnimationFrame>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    /// Display time in centiseconds; `0` means "no explicit delay".
    pub delay_cs: u16,
    pub disposal: Disposal,
    /// Keep the alpha channel when encoding instead of flattening over the background color.
    pub transparent: bool,
}

/// What happens to a frame's area before the next one is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    Keep,
    Background,
    Previous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Infinite,
    Finite(u16),
}

/// Container formats the encoder writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemeFormat {
    Png,
    Gif,
}

impl MemeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MemeFormat::Png => "png",
            MemeFormat::Gif => "gif",
        }
    }

    /// Format for a file extension, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MemeFormat::Png),
            "gif" => Some(MemeFormat::Gif),
            _ => None,
        }
    }
}
