//! Cooperative cancellation
//!
//! Long loops (bootstrap epochs, hill-climb iterations, simulated
//! transactions) check the token between units of work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TrustbedError};

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every holder of this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` if cancellation was requested
    pub fn check(&self, what: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(TrustbedError::Cancelled(what.to_string()));
        }
        Ok(())
    }
}
