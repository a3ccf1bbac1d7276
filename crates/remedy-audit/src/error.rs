//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur while recording outcome events.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to initialize the recorder or its sink.
    #[error("failed to initialize outcome recorder: {0}")]
    InitializationFailed(String),

    /// Failed to append an event.
    #[error("failed to append outcome event: {0}")]
    AppendFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
