//! Error types for symscope queries.
//!
//! The error taxonomy distinguishes three outcomes a caller must treat
//! differently:
//!
//! - **Cancellation**: the caller's [`CancellationToken`](crate::cancel::CancellationToken)
//!   fired mid-query. This means "no answer available now", not "empty result".
//! - **Invariant violations**: the bound snapshot handed over by the binder host
//!   is structurally impossible (scope cycle, dangling scope reference,
//!   inheritance cycle). These indicate a bug upstream and are never healed.
//! - **Snapshot loading errors**: the serialized snapshot is unreadable or was
//!   written with a different schema version.
//!
//! Malformed source text and unresolved symbols are *not* errors: queries
//! return `Ok` with an empty (or partial) result for those.

use thiserror::Error;

/// Unified error type for semantic queries.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The query was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// The snapshot violates a structural invariant (binder bug).
    #[error("internal error: {message}")]
    InvariantViolation { message: String },

    /// The serialized snapshot could not be interpreted.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    /// IO error while loading a snapshot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for semantic queries.
pub type SemanticResult<T> = Result<T, SemanticError>;

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SemanticError {
    /// Create an invariant violation error and log it.
    ///
    /// Invariant violations are bugs in the binder host, so they are logged at
    /// `error` level where they are raised to surface loudly in test runs.
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "snapshot invariant violated");
        SemanticError::InvariantViolation { message }
    }

    /// Create an invalid snapshot error.
    pub fn invalid_snapshot(message: impl Into<String>) -> Self {
        SemanticError::InvalidSnapshot {
            message: message.into(),
        }
    }

    /// Check if this error is a cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SemanticError::Cancelled)
    }
}

// ============================================================================
// Tests
// ============================================================================
