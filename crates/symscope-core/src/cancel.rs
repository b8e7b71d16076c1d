//! Cooperative cancellation for semantic queries.
//!
//! Every public query accepts a [`CancellationToken`] and checks it at least
//! once per scope-tree (or type-hierarchy) traversal step. A fired token
//! aborts the query with [`SemanticError::Cancelled`] instead of returning a
//! silently truncated result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{SemanticError, SemanticResult};

/// Cancellation signal shared between a host and the queries it started.
///
/// Cloning the token shares the underlying flag, so a host can keep one clone
/// and hand another to a worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that never fires, for callers that cannot cancel.
    pub fn none() -> Self {
        Self::default()
    }

    /// Request cancellation of every query observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self) -> SemanticResult<()> {
        if self.is_cancelled() {
            Err(SemanticError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes_check() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let worker = token.clone();
        token.cancel();
        assert!(worker.is_cancelled());
        assert!(matches!(worker.check(), Err(SemanticError::Cancelled)));
    }

    #[test]
    fn cancel_from_another_thread() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .expect("cancel thread panicked");
        assert!(token.check().is_err());
    }
}
