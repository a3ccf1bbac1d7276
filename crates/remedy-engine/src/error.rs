//! Engine and rollback error types.
//!
//! Denials, blocks, and degradations are terminal statuses, not errors;
//! these types cover configuration lookups, audit IO, and rollback contract
//! breaches only.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by proposal building and evaluation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration lookup failed (unknown action type, malformed
    /// playbook).
    #[error(transparent)]
    Config(#[from] remedy_core::ConfigError),

    /// The explanation names no probable cause to reference.
    #[error("explanation '{0}' names no probable cause")]
    NoCause(String),

    /// The outcome event could not be appended.
    #[error(transparent)]
    Audit(#[from] remedy_audit::AuditError),

    /// Rollback payload construction failed after a successful execution.
    #[error(transparent)]
    Rollback(#[from] RollbackError),
}

/// Errors surfaced by rollback payload construction and reversal.
#[derive(Debug, Error)]
pub enum RollbackError {
    /// The playbook does not support rollback for this action type.
    #[error("rollback is not supported for action type '{0}'")]
    Unsupported(String),

    /// A field the playbook requires would be absent from the payload.
    #[error("rollback payload is missing required field '{0}'")]
    MissingField(String),

    /// The reversal validity window has passed.
    #[error("rollback payload for action '{action_id}' expired at {expires_at}")]
    Expired {
        action_id: String,
        expires_at: DateTime<Utc>,
    },

    /// The reversal itself failed.
    #[error("reversal failed: {0}")]
    ReversalFailed(String),
}
