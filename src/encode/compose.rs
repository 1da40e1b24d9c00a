use crate::config::ComposeOptions;
use crate::encode::meme::{Animation, AnimationFrame, Disposal, Meme, Repeat};
use crate::foundation::cancel::CancellationToken;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::render::stream::FrameStream;

impl FrameStream<'_> {
    /// Flatten the stream into its final artifact.
    ///
    /// One frame becomes a [`Meme::Still`]; more become an infinitely repeating
    /// [`Meme::Animation`] whose frames are opaque, background-disposed and share one delay.
    /// An empty stream is an [`InvalidSequence`](LoopsmithError::InvalidSequence).
    #[tracing::instrument(skip_all)]
    pub fn auto_compose(
        self,
        options: &ComposeOptions,
        cancel: &CancellationToken,
    ) -> LoopsmithResult<Meme> {
        let mut frames = self.collect_sequence(cancel)?.into_frames();
        cancel.check(Stage::Flatten)?;

        let root = match frames.len() {
            0 => {
                return Err(LoopsmithError::invalid_sequence(
                    Stage::Flatten,
                    "cannot compose an empty sequence",
                ));
            }
            1 => {
                let still = frames.remove(0).into_image();
                tracing::debug!(width = still.width(), height = still.height(), "composed still");
                return Ok(Meme::Still(still));
            }
            _ => frames[0].dimensions(),
        };

        let delay_cs = options.frame_delay();
        let mut out = Vec::with_capacity(frames.len());
        for frame in frames {
            if frame.dimensions() != root {
                return Err(LoopsmithError::contract(
                    Stage::Flatten,
                    format!(
                        "frame {} is {}x{}, expected {}x{}",
                        frame.index,
                        frame.width(),
                        frame.height(),
                        root.0,
                        root.1
                    ),
                ));
            }
            out.push(AnimationFrame {
                image: frame.into_image(),
                delay_cs,
                disposal: Disposal::Background,
                transparent: false,
            });
        }

        tracing::debug!(frames = out.len(), delay_cs, "composed animation");
        Ok(Meme::Animation(Animation {
            width: root.0,
            height: root.1,
            repeat: Repeat::Infinite,
            frames: out,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/compose.rs"]
mod tests;
