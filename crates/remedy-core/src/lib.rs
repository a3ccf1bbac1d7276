use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// Configuration types shared across all Remedy crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{
    AuditConfig, AutoExecutionFlags, ConfigError, DryRunFlags, EligibilityConfig, ExecutionFlags,
    Playbook, PlaybookRegistry, RollbackContract, SafetyLimits, SelectionPolicy, SignalThreshold,
};

/// Confidence attached to a cause or evidence item by the diagnostic producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Risk level declared for a recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// How a proposal is allowed to be carried out.
///
/// Modes are ordered by permissiveness: `AutoIfSafe` > `DryRun` > `SuggestOnly`.
/// Downstream gates may only ever downgrade a mode, never upgrade it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Build parameters for manual application; no side effects.
    SuggestOnly,
    /// Execute automatically when eligibility and safety checks pass.
    AutoIfSafe,
    /// Evaluate fully and simulate execution without side effects.
    DryRun,
}

impl ExecutionMode {
    fn rank(self) -> u8 {
        match self {
            ExecutionMode::SuggestOnly => 0,
            ExecutionMode::DryRun => 1,
            ExecutionMode::AutoIfSafe => 2,
        }
    }

    /// Downgrade this mode to `ceiling` if it is more permissive than the ceiling.
    pub fn clamped_to(self, ceiling: ExecutionMode) -> ExecutionMode {
        if self.rank() > ceiling.rank() { ceiling } else { self }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::SuggestOnly => write!(f, "suggest_only"),
            ExecutionMode::AutoIfSafe => write!(f, "auto_if_safe"),
            ExecutionMode::DryRun => write!(f, "dry_run"),
        }
    }
}

/// A probable cause named by the diagnostic producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbableCause {
    pub cause_id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub confidence: Confidence,
}

/// A single supporting evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub name: String,
    pub value: serde_json::Value,
    pub source: String,
    pub confidence: Confidence,
}

/// An action the diagnostic producer recommends for the flagged observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action_type: String,
    pub risk: RiskLevel,
    /// Execution mode requested by the producer. When absent, the playbook
    /// default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
}

/// A diagnostic explanation produced upstream.
///
/// Immutable once produced; consumed exactly once by the proposal builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub observation_id: String,
    pub trace_id: String,
    pub rule_version: String,
    /// Probable causes in the producer's preference order.
    pub causes: Vec<ProbableCause>,
    /// Supporting evidence keyed by cause id.
    #[serde(default)]
    pub evidence: HashMap<String, Vec<EvidenceItem>>,
    /// Recommended actions in the producer's preference order.
    pub recommended_actions: Vec<RecommendedAction>,
}

/// A pointer into an explanation's evidence map (no copy of the value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub cause_id: String,
    pub name: String,
}

/// A single candidate corrective action derived from one explanation.
///
/// Once a proposal enters the execution engine its mode and identifiers are
/// frozen; only a terminal status is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionProposal {
    pub proposal_id: Uuid,
    pub trace_id: String,
    pub observation_id: String,
    pub cause_id: String,
    pub action_type: String,
    pub rule_version: String,
    pub risk: RiskLevel,
    pub mode: ExecutionMode,
    pub evidence_refs: Vec<EvidenceRef>,
}

/// Where a change is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetScope {
    pub campaign_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_group_id: Option<String>,
}

/// One concrete item an action intends to apply (e.g., a negative keyword).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    /// Sub-type of the item (e.g., keyword match type).
    pub variant: String,
}

/// Concrete parameters a proposal intends to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    pub scope: TargetScope,
    pub items: Vec<ActionItem>,
}

/// Cumulative state supplied by the caller. The pipeline never tracks
/// counters across calls itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CumulativeState {
    #[serde(default)]
    pub items_applied_today: u64,
}

/// One applied change, with enough detail to reverse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub text: String,
    pub variant: String,
}

/// Self-contained data needed to reverse an executed action within a
/// time-bounded validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPayload {
    pub action_id: String,
    pub method: String,
    pub campaign_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_group_id: Option<String>,
    pub changes: Vec<AppliedChange>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub trace_id: String,
    pub rule_version: String,
}

impl RollbackPayload {
    /// Field names a playbook's `payload_required_fields` may reference.
    pub const KNOWN_FIELDS: &'static [&'static str] = &[
        "action_id",
        "method",
        "campaign_id",
        "ad_group_id",
        "changes",
        "created_at",
        "expires_at",
        "trace_id",
        "rule_version",
    ];

    /// Check whether the named field carries a usable value in this payload.
    pub fn contains_field(&self, name: &str) -> bool {
        match name {
            "action_id" => !self.action_id.is_empty(),
            "method" => !self.method.is_empty(),
            "campaign_id" => !self.campaign_id.is_empty(),
            "ad_group_id" => self.ad_group_id.is_some(),
            "changes" => !self.changes.is_empty(),
            "created_at" | "expires_at" => true,
            "trace_id" => !self.trace_id.is_empty(),
            "rule_version" => !self.rule_version.is_empty(),
            _ => false,
        }
    }

    /// Whether the reversal validity window has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_mode_clamp_only_downgrades() {
        use ExecutionMode::*;
        assert_eq!(AutoIfSafe.clamped_to(SuggestOnly), SuggestOnly);
        assert_eq!(AutoIfSafe.clamped_to(DryRun), DryRun);
        assert_eq!(DryRun.clamped_to(AutoIfSafe), DryRun);
        assert_eq!(SuggestOnly.clamped_to(AutoIfSafe), SuggestOnly);
        assert_eq!(AutoIfSafe.clamped_to(AutoIfSafe), AutoIfSafe);
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: ExecutionMode = serde_json::from_str("\"auto_if_safe\"").unwrap();
        assert_eq!(mode, ExecutionMode::AutoIfSafe);
        assert_eq!(
            serde_json::to_string(&ExecutionMode::SuggestOnly).unwrap(),
            "\"suggest_only\""
        );
    }

    fn sample_payload() -> RollbackPayload {
        RollbackPayload {
            action_id: "act_1".to_string(),
            method: "remove_negative_keywords".to_string(),
            campaign_id: "cmp_42".to_string(),
            ad_group_id: None,
            changes: vec![AppliedChange {
                text: "free stuff".to_string(),
                variant: "exact".to_string(),
            }],
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(7),
            trace_id: "trace_1".to_string(),
            rule_version: "wasted_spend_v2".to_string(),
        }
    }

    #[test]
    fn test_payload_contains_field() {
        let payload = sample_payload();
        assert!(payload.contains_field("campaign_id"));
        assert!(payload.contains_field("changes"));
        assert!(!payload.contains_field("ad_group_id"));
        assert!(!payload.contains_field("nonexistent"));
    }

    #[test]
    fn test_payload_expiry() {
        let mut payload = sample_payload();
        assert!(!payload.is_expired(Utc::now()));
        payload.expires_at = Utc::now() - Duration::hours(1);
        assert!(payload.is_expired(Utc::now()));
    }
}
