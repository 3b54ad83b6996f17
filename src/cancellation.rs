//! Cooperative cancellation shared between a load task and its extractor.

use crate::error::{ReaderError, Result};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Flag checked by long-running extractors between units of work.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with an internal error if cancellation was requested.
    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ReaderError::Internal(format!(
                "operation cancelled at stage={stage}"
            )));
        }
        Ok(())
    }
}
