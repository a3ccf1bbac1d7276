//! Outcome event types.
//!
//! One immutable event per terminal decision, denials included. Events
//! follow the format: [trace - action - status - notes].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal status of one proposal evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Executor invoked; `success` carries the result.
    AutoExecuted,
    /// Fully evaluated, execution simulated without side effects.
    DryRun,
    /// Parameters returned for manual application.
    SuggestOnly,
    /// Safety limits breached.
    Blocked,
    /// Action type outside the hard allow-list or no executor registered.
    DenyUnsupportedAction,
    /// Read-only environment.
    DenyReadonlyEnv,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoExecuted => write!(f, "AUTO_EXECUTED"),
            Self::DryRun => write!(f, "DRY_RUN"),
            Self::SuggestOnly => write!(f, "SUGGEST_ONLY"),
            Self::Blocked => write!(f, "BLOCKED"),
            Self::DenyUnsupportedAction => write!(f, "DENY_UNSUPPORTED_ACTION"),
            Self::DenyReadonlyEnv => write!(f, "DENY_READONLY_ENV"),
        }
    }
}

/// The immutable audit record of one terminal decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Terminal status.
    pub status: OutcomeStatus,

    // ===== Correlation fields =====
    /// Trace/correlation ID from the originating explanation.
    pub trace_id: String,

    /// Proposal this decision terminated.
    pub proposal_id: Uuid,

    /// Flagged observation the proposal derived from.
    pub observation_id: String,

    /// Action type identifier.
    pub action_type: String,

    // ===== Decision detail =====
    /// Human-readable notes explaining the status (eligibility reasons,
    /// safety violations, executor errors).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    /// `Some(true)`/`Some(false)` for executed actions, `None` for
    /// denied/blocked/suggested/simulated ones.
    pub success: Option<bool>,

    /// Rollback payload captured on successful execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<serde_json::Value>,

    /// Executor invocation duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Additional metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl OutcomeEvent {
    /// Create a new event with the given status and correlation fields.
    pub fn new(
        status: OutcomeStatus,
        trace_id: impl Into<String>,
        proposal_id: Uuid,
        observation_id: impl Into<String>,
        action_type: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            status,
            trace_id: trace_id.into(),
            proposal_id,
            observation_id: observation_id.into(),
            action_type: action_type.into(),
            notes: Vec::new(),
            success: None,
            rollback: None,
            duration_ms: None,
            meta: serde_json::Value::Null,
        }
    }

    /// Create a builder for an outcome event.
    pub fn builder(
        status: OutcomeStatus,
        trace_id: impl Into<String>,
        proposal_id: Uuid,
        observation_id: impl Into<String>,
        action_type: impl Into<String>,
    ) -> OutcomeEventBuilder {
        OutcomeEventBuilder {
            event: Self::new(status, trace_id, proposal_id, observation_id, action_type),
        }
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] STATUS trace=... action=... proposal=...`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} trace={} action={} proposal={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.status,
            self.trace_id,
            self.action_type,
            self.proposal_id,
        );

        match self.success {
            Some(success) => line.push_str(&format!(" success={}", success)),
            None => line.push_str(" success=null"),
        }

        if let Some(duration) = self.duration_ms {
            line.push_str(&format!(" duration_ms={}", duration));
        }

        if !self.notes.is_empty() {
            line.push_str(&format!(" notes=[{}]", self.notes.join("; ")));
        }

        if self.rollback.is_some() {
            line.push_str(" rollback=captured");
        }

        line
    }
}

/// Builder for outcome events.
#[derive(Debug)]
pub struct OutcomeEventBuilder {
    event: OutcomeEvent,
}

impl OutcomeEventBuilder {
    /// Append one explanatory note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.event.notes.push(note.into());
        self
    }

    /// Append several explanatory notes.
    pub fn notes(mut self, notes: impl IntoIterator<Item = String>) -> Self {
        self.event.notes.extend(notes);
        self
    }

    /// Set the execution success flag.
    pub fn success(mut self, success: bool) -> Self {
        self.event.success = Some(success);
        self
    }

    /// Attach the rollback payload.
    pub fn rollback(mut self, rollback: serde_json::Value) -> Self {
        self.event.rollback = Some(rollback);
        self
    }

    /// Set the executor invocation duration.
    pub fn duration_ms(mut self, duration: u64) -> Self {
        self.event.duration_ms = Some(duration);
        self
    }

    /// Set additional metadata.
    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.event.meta = meta;
        self
    }

    /// Build the outcome event.
    pub fn build(self) -> OutcomeEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let proposal_id = Uuid::new_v4();
        let event = OutcomeEvent::builder(
            OutcomeStatus::AutoExecuted,
            "trace_1",
            proposal_id,
            "obs_1",
            "add_negative_keywords",
        )
        .success(true)
        .duration_ms(120)
        .rollback(serde_json::json!({"method": "remove_negative_keywords"}))
        .build();

        assert_eq!(event.status, OutcomeStatus::AutoExecuted);
        assert_eq!(event.proposal_id, proposal_id);
        assert_eq!(event.success, Some(true));
        assert!(event.rollback.is_some());
    }

    #[test]
    fn test_denial_has_null_success() {
        let event = OutcomeEvent::new(
            OutcomeStatus::DenyUnsupportedAction,
            "trace_1",
            Uuid::new_v4(),
            "obs_1",
            "UNSUPPORTED_ACTION_XYZ",
        );
        assert_eq!(event.success, None);

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("success").unwrap().is_null());
    }

    #[test]
    fn test_to_log_line() {
        let event = OutcomeEvent::builder(
            OutcomeStatus::Blocked,
            "trace_1",
            Uuid::new_v4(),
            "obs_1",
            "add_negative_keywords",
        )
        .note("15 items requested in a single run, exceeding the per-run limit of 10")
        .build();

        let line = event.to_log_line();
        assert!(line.contains("BLOCKED"));
        assert!(line.contains("trace=trace_1"));
        assert!(line.contains("action=add_negative_keywords"));
        assert!(line.contains("success=null"));
        assert!(line.contains("per-run limit"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", OutcomeStatus::AutoExecuted), "AUTO_EXECUTED");
        assert_eq!(
            format!("{}", OutcomeStatus::DenyUnsupportedAction),
            "DENY_UNSUPPORTED_ACTION"
        );
        assert_eq!(
            format!("{}", OutcomeStatus::DenyReadonlyEnv),
            "DENY_READONLY_ENV"
        );
    }
}
