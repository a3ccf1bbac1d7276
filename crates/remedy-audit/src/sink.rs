//! Outcome sink backends.
//!
//! Sinks expose a single `append` operation: the pipeline never reads or
//! mutates past events, so no query surface exists here by design.

use crate::error::AuditError;
use crate::event::OutcomeEvent;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for append-only outcome sinks.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    /// Append one outcome event.
    async fn append(&self, event: OutcomeEvent) -> Result<(), AuditError>;
}

/// Console sink (human-readable log lines to stdout).
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeSink for ConsoleSink {
    async fn append(&self, event: OutcomeEvent) -> Result<(), AuditError> {
        println!("{}", event.to_log_line());
        Ok(())
    }
}

/// File sink (appends JSON Lines to a log file).
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create a new file sink, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl OutcomeSink for FileSink {
    async fn append(&self, event: OutcomeEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }
}

/// Dual sink: JSON Lines to a file plus log lines to the console.
pub struct DualSink {
    file: FileSink,
    console: ConsoleSink,
}

impl DualSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            file: FileSink::new(path)?,
            console: ConsoleSink::new(),
        })
    }
}

#[async_trait]
impl OutcomeSink for DualSink {
    async fn append(&self, event: OutcomeEvent) -> Result<(), AuditError> {
        self.console.append(event.clone()).await?;
        self.file.append(event).await
    }
}

/// In-memory sink for tests and embedding callers.
#[derive(Default)]
pub struct MemorySink {
    events: RwLock<Vec<OutcomeEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended events, in append order.
    pub fn events(&self) -> Vec<OutcomeEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OutcomeSink for MemorySink {
    async fn append(&self, event: OutcomeEvent) -> Result<(), AuditError> {
        self.events
            .write()
            .map_err(|e| AuditError::AppendFailed(format!("poisoned sink lock: {}", e)))?
            .push(event);
        Ok(())
    }
}

/// No-op sink for disabled recording.
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeSink for NullSink {
    async fn append(&self, _event: OutcomeEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
