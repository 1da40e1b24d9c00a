use std::fmt;

/// Convenience result alias used across the crate.
pub type LoopsmithResult<T> = Result<T, LoopsmithError>;

/// Boxed collaborator error carried by [`LoopsmithError::Upstream`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage that reported an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Frame sources (decoding, directory enumeration).
    Source,
    /// Cycle expansion.
    Expander,
    /// LCM synchronization of two sequences.
    Synchronizer,
    /// Per-frame apply and zip-merge.
    Pipeline,
    /// Geometric and pixel transforms (draw, rotate, slide, blur, matting).
    Transform,
    /// Auto-compose.
    Flatten,
    /// Artifact encoding.
    Encode,
    /// External processes (`ffmpeg`).
    External,
}

impl Stage {
    /// Stable lowercase name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Expander => "expander",
            Self::Synchronizer => "synchronizer",
            Self::Pipeline => "pipeline",
            Self::Transform => "transform",
            Self::Flatten => "flatten",
            Self::Encode => "encode",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type.
#[derive(thiserror::Error, Debug)]
pub enum LoopsmithError {
    /// An operation received zero frames where at least one was required.
    #[error("invalid sequence in {stage}: {message}")]
    InvalidSequence {
        /// Failing stage.
        stage: Stage,
        /// Violated precondition.
        message: String,
    },

    /// A caller passed an out-of-range parameter.
    #[error("contract violation in {stage}: {message}")]
    ContractViolation {
        /// Failing stage.
        stage: Stage,
        /// Violated precondition.
        message: String,
    },

    /// A collaborator (codec, external process, inference model) failed.
    #[error("upstream failure in {stage}: {source}")]
    Upstream {
        /// Failing stage.
        stage: Stage,
        /// Collaborator error.
        source: BoxError,
    },

    /// The operation observed a cancellation signal.
    #[error("cancelled during {stage}")]
    Cancelled {
        /// Stage that observed the signal.
        stage: Stage,
    },

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoopsmithError {
    /// Build an [`LoopsmithError::InvalidSequence`].
    pub fn invalid_sequence(stage: Stage, message: impl Into<String>) -> Self {
        Self::InvalidSequence {
            stage,
            message: message.into(),
        }
    }

    /// Build an [`LoopsmithError::ContractViolation`].
    pub fn contract(stage: Stage, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            stage,
            message: message.into(),
        }
    }

    /// Wrap a collaborator failure.
    pub fn upstream(stage: Stage, source: impl Into<BoxError>) -> Self {
        Self::Upstream {
            stage,
            source: source.into(),
        }
    }

    /// Build an [`LoopsmithError::Cancelled`].
    pub fn cancelled(stage: Stage) -> Self {
        Self::Cancelled { stage }
    }

    /// Stage that reported the error, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidSequence { stage, .. }
            | Self::ContractViolation { stage, .. }
            | Self::Upstream { stage, .. }
            | Self::Cancelled { stage } => Some(*stage),
            Self::Other(_) => None,
        }
    }

    /// Return `true` for [`LoopsmithError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
