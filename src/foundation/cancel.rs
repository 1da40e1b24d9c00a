use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};

/// Cooperative cancellation signal shared between a caller and the stages it drives.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancellationToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return [`LoopsmithError::Cancelled`] for `stage` if cancellation was requested.
    pub fn check(&self, stage: Stage) -> LoopsmithResult<()> {
        if self.is_cancelled() {
            return Err(LoopsmithError::cancelled(stage));
        }
        Ok(())
    }
}
