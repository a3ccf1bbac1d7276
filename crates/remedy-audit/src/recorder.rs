//! Outcome recorder.
//!
//! Thin wrapper over a sink that applies the audit configuration and mirrors
//! each event into `tracing` for structured-logging integration.

use remedy_core::AuditConfig;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AuditError;
use crate::event::OutcomeEvent;
use crate::sink::{ConsoleSink, DualSink, FileSink, NullSink, OutcomeSink};

/// Records terminal outcome events to the configured sink.
pub struct OutcomeRecorder {
    config: AuditConfig,
    sink: Arc<dyn OutcomeSink>,
}

impl OutcomeRecorder {
    /// Create a recorder from configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let sink: Arc<dyn OutcomeSink> = if !config.enabled {
            Arc::new(NullSink::new())
        } else {
            let file_path = Self::resolve_log_path(&config);
            if config.stdout {
                Arc::new(DualSink::new(&file_path)?)
            } else {
                Arc::new(FileSink::new(&file_path)?)
            }
        };

        Ok(Self { config, sink })
    }

    /// Create a recorder with a custom sink.
    pub fn with_sink(config: AuditConfig, sink: Arc<dyn OutcomeSink>) -> Self {
        Self { config, sink }
    }

    /// Create a disabled (no-op) recorder.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            sink: Arc::new(NullSink::new()),
        }
    }

    /// Create a console-only recorder (useful for development).
    pub fn console_only() -> Self {
        Self {
            config: AuditConfig {
                enabled: true,
                stdout: true,
                ..Default::default()
            },
            sink: Arc::new(ConsoleSink::new()),
        }
    }

    fn resolve_log_path(config: &AuditConfig) -> PathBuf {
        let mut path = PathBuf::from(&config.directory);
        path.push("outcomes.log");
        path
    }

    /// Check if recording is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record one outcome event.
    pub async fn record(&self, event: OutcomeEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(
            event_id = %event.event_id,
            status = %event.status,
            trace = %event.trace_id,
            action = %event.action_type,
            "outcome event"
        );

        self.sink.append(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OutcomeStatus;
    use crate::sink::MemorySink;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_recorder_drops_events() {
        let sink = Arc::new(MemorySink::new());
        let recorder = OutcomeRecorder::with_sink(
            AuditConfig {
                enabled: false,
                ..Default::default()
            },
            sink.clone(),
        );

        recorder
            .record(OutcomeEvent::new(
                OutcomeStatus::DryRun,
                "trace_1",
                Uuid::new_v4(),
                "obs_1",
                "add_negative_keywords",
            ))
            .await
            .unwrap();

        assert!(!recorder.is_enabled());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_enabled_recorder_appends() {
        let sink = Arc::new(MemorySink::new());
        let recorder = OutcomeRecorder::with_sink(AuditConfig::default(), sink.clone());

        recorder
            .record(OutcomeEvent::new(
                OutcomeStatus::DenyReadonlyEnv,
                "trace_1",
                Uuid::new_v4(),
                "obs_1",
                "add_negative_keywords",
            ))
            .await
            .unwrap();

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].status, OutcomeStatus::DenyReadonlyEnv);
    }
}
