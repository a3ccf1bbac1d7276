//! Playbook definitions and the read-only playbook registry.
//!
//! A playbook is the per-action-type configuration unit: eligibility
//! profiles, hard safety limits, candidate selection policy, and the
//! rollback contract. Playbooks are user-edited YAML, loaded once at process
//! start and validated before any evaluation can occur.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ConfigError;
use crate::{ExecutionMode, RollbackPayload};

/// Per-action-type configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playbook {
    /// Action type identifier this playbook governs.
    pub action_type: String,

    /// Playbook schema version (semver format).
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Execution mode a proposal starts from when the recommendation does
    /// not request one.
    pub default_mode: ExecutionMode,

    /// Named eligibility profiles and the active one.
    pub eligibility: EligibilityConfig,

    /// Hard bounds on the shape of action parameters.
    #[serde(default)]
    pub safety_limits: SafetyLimits,

    /// How raw candidates are filtered and ranked before becoming
    /// parameters.
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    /// Rollback contract for auto-executed actions.
    #[serde(default)]
    pub rollback: RollbackContract,
}

/// Eligibility section: one or more named threshold profiles.
///
/// Profiles let operators tune aggressiveness without code changes: the same
/// signal values may be classified differently by the `conservative` and
/// `aggressive` profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Name of the profile in effect at evaluation time.
    pub active_profile: String,

    /// Profile name -> signal name -> threshold bounds.
    pub profiles: HashMap<String, HashMap<String, SignalThreshold>>,
}

/// Minimum/maximum bounds on one named numeric signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SignalThreshold {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl SignalThreshold {
    /// Whether the supplied value satisfies both bounds. Bounds are
    /// inclusive, so a value exactly at the boundary passes.
    pub fn satisfied_by(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// Hard safety limits, independent of eligibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum items a single run may apply.
    #[serde(default = "default_max_items_per_run")]
    pub max_items_per_run: u64,

    /// Maximum items applied per day, cumulative across runs.
    #[serde(default = "default_max_items_per_day")]
    pub max_items_per_day: u64,

    /// Minimum length of an item's text.
    #[serde(default = "default_min_item_length")]
    pub min_item_length: usize,

    /// Brand terms that must never appear in item text
    /// (case-insensitive substring match).
    #[serde(default)]
    pub brand_terms: Vec<String>,

    /// Regexes matching identifier-shaped text (SKUs, campaign ids) that
    /// must never be applied as items.
    #[serde(default)]
    pub identifier_patterns: Vec<String>,

    /// Allowed item sub-types. Empty means every sub-type is allowed.
    #[serde(default)]
    pub allowed_variants: Vec<String>,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_items_per_run: default_max_items_per_run(),
            max_items_per_day: default_max_items_per_day(),
            min_item_length: default_min_item_length(),
            brand_terms: Vec::new(),
            identifier_patterns: Vec::new(),
            allowed_variants: Vec::new(),
        }
    }
}

/// How candidates are filtered and ranked before becoming parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Metric name candidates are ranked by, descending.
    #[serde(default = "default_rank_by")]
    pub rank_by: String,

    /// Upper bound on candidates kept after ranking.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Minimum value of the ranking metric for a candidate to be kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_metric: Option<f64>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            rank_by: default_rank_by(),
            max_candidates: default_max_candidates(),
            min_metric: None,
        }
    }
}

/// Rollback contract declared by the playbook.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollbackContract {
    /// Whether auto-executed actions of this type can be reversed.
    #[serde(default)]
    pub supported: bool,

    /// Name of the reversal method (e.g., "remove_negative_keywords").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Fields a valid rollback payload must carry. Must be non-empty when
    /// `supported` is true.
    #[serde(default)]
    pub payload_required_fields: Vec<String>,

    /// How long reversal remains valid, in days.
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,
}

impl Playbook {
    /// Load a playbook from a YAML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a playbook from YAML content and validate it.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let playbook: Self = serde_yaml::from_str(content)?;
        playbook.validate()?;
        Ok(playbook)
    }

    /// Validate the playbook. Called on every load path; loading an invalid
    /// playbook is a startup-time fatal error, never a runtime one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.action_type.is_empty() {
            return Err(ConfigError::Invalid(
                "playbook is missing an action_type".to_string(),
            ));
        }

        if self.eligibility.profiles.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "playbook '{}' declares no eligibility profiles",
                self.action_type
            )));
        }

        if !self
            .eligibility
            .profiles
            .contains_key(&self.eligibility.active_profile)
        {
            return Err(ConfigError::Invalid(format!(
                "playbook '{}': active_profile '{}' does not name an existing profile",
                self.action_type, self.eligibility.active_profile
            )));
        }

        for (name, profile) in &self.eligibility.profiles {
            if profile.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "playbook '{}': eligibility profile '{}' declares no signal thresholds",
                    self.action_type, name
                )));
            }
        }

        for pattern in &self.safety_limits.identifier_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!(
                    "playbook '{}': identifier pattern '{}' does not compile: {}",
                    self.action_type, pattern, e
                ))
            })?;
        }

        if self.rollback.supported {
            if self
                .rollback
                .method
                .as_deref()
                .map(|m| m.is_empty())
                .unwrap_or(true)
            {
                return Err(ConfigError::Invalid(format!(
                    "playbook '{}': rollback.supported is true but no method is declared",
                    self.action_type
                )));
            }
            if self.rollback.payload_required_fields.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "playbook '{}': rollback.supported is true but payload_required_fields is empty",
                    self.action_type
                )));
            }
            for field in &self.rollback.payload_required_fields {
                if !RollbackPayload::KNOWN_FIELDS.contains(&field.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "playbook '{}': rollback field '{}' is not a known payload field",
                        self.action_type, field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get a named eligibility profile.
    pub fn profile(&self, name: &str) -> Option<&HashMap<String, SignalThreshold>> {
        self.eligibility.profiles.get(name)
    }

    /// Get the active eligibility profile.
    ///
    /// Validation guarantees the active profile exists on a loaded playbook,
    /// but a hand-built one may name a missing profile; callers decide how
    /// to treat `None`.
    pub fn active_profile(&self) -> Option<&HashMap<String, SignalThreshold>> {
        self.profile(&self.eligibility.active_profile)
    }
}

/// Read-only lookup of playbooks by action type.
///
/// The registry is the only shared resource across concurrent evaluations;
/// it exposes no mutation API after load, so an `Arc<PlaybookRegistry>` is
/// safe to share between worker tasks.
#[derive(Debug, Clone, Default)]
pub struct PlaybookRegistry {
    playbooks: HashMap<String, Playbook>,
}

impl PlaybookRegistry {
    /// Build a registry from already-parsed playbooks, re-validating each.
    pub fn from_playbooks(
        playbooks: impl IntoIterator<Item = Playbook>,
    ) -> Result<Self, ConfigError> {
        let mut map = HashMap::new();
        for playbook in playbooks {
            playbook.validate()?;
            if map.contains_key(&playbook.action_type) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate playbook for action type '{}'",
                    playbook.action_type
                )));
            }
            map.insert(playbook.action_type.clone(), playbook);
        }
        Ok(Self { playbooks: map })
    }

    /// Load every `*.yaml` / `*.yml` playbook file from a directory.
    pub fn load_dir(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut playbooks = Vec::new();
        for entry in fs::read_dir(path.as_ref())? {
            let entry = entry?;
            let path = entry.path();
            if path
                .extension()
                .map(|e| e == "yaml" || e == "yml")
                .unwrap_or(false)
            {
                playbooks.push(Playbook::from_file(&path)?);
            }
        }
        Self::from_playbooks(playbooks)
    }

    /// Look up the playbook for an action type.
    pub fn get(&self, action_type: &str) -> Result<&Playbook, ConfigError> {
        self.playbooks
            .get(action_type)
            .ok_or_else(|| ConfigError::UnknownActionType(action_type.to_string()))
    }

    /// Action types with a registered playbook.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.playbooks.keys().map(String::as_str)
    }
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn default_max_items_per_run() -> u64 {
    10
}

fn default_max_items_per_day() -> u64 {
    50
}

fn default_min_item_length() -> usize {
    3
}

fn default_rank_by() -> String {
    "wasted_spend".to_string()
}

fn default_max_candidates() -> usize {
    10
}

fn default_validity_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
action_type: add_negative_keywords
schema_version: "1.0.0"
default_mode: auto_if_safe
eligibility:
  active_profile: balanced
  profiles:
    conservative:
      wasted_spend_ratio: { min: 0.5 }
      clicks: { min: 100 }
    balanced:
      wasted_spend_ratio: { min: 0.3 }
      clicks: { min: 50 }
safety_limits:
  max_items_per_run: 10
  max_items_per_day: 50
  min_item_length: 3
  brand_terms: [acme]
  identifier_patterns: ['^[A-Z]{2,}-\d+$']
  allowed_variants: [exact, phrase]
selection_policy:
  rank_by: wasted_spend
  max_candidates: 10
rollback:
  supported: true
  method: remove_negative_keywords
  payload_required_fields: [campaign_id, changes, created_at, expires_at]
  validity_days: 7
"#;

    #[test]
    fn test_parse_and_validate_playbook() {
        let playbook = Playbook::from_yaml(SAMPLE).unwrap();
        assert_eq!(playbook.action_type, "add_negative_keywords");
        assert_eq!(playbook.default_mode, ExecutionMode::AutoIfSafe);
        assert_eq!(playbook.eligibility.active_profile, "balanced");
        assert_eq!(playbook.safety_limits.max_items_per_run, 10);
        assert!(playbook.rollback.supported);

        let balanced = playbook.active_profile().unwrap();
        assert!(balanced.get("wasted_spend_ratio").unwrap().satisfied_by(0.3));
        assert!(!balanced.get("wasted_spend_ratio").unwrap().satisfied_by(0.2));
    }

    #[test]
    fn test_active_profile_lookup_is_honest() {
        let mut playbook = Playbook::from_yaml(SAMPLE).unwrap();
        assert!(playbook.active_profile().is_some());

        playbook.eligibility.active_profile = "missing".to_string();
        assert!(playbook.active_profile().is_none());
    }

    #[test]
    fn test_unknown_active_profile_rejected() {
        let yaml = SAMPLE.replace("active_profile: balanced", "active_profile: reckless");
        let err = Playbook::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("reckless"));
    }

    #[test]
    fn test_rollback_without_fields_rejected() {
        let yaml = SAMPLE.replace(
            "payload_required_fields: [campaign_id, changes, created_at, expires_at]",
            "payload_required_fields: []",
        );
        let err = Playbook::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("payload_required_fields"));
    }

    #[test]
    fn test_unknown_rollback_field_rejected() {
        let yaml = SAMPLE.replace(
            "payload_required_fields: [campaign_id, changes, created_at, expires_at]",
            "payload_required_fields: [campaign_id, undo_token]",
        );
        let err = Playbook::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("undo_token"));
    }

    #[test]
    fn test_bad_identifier_pattern_rejected() {
        let yaml = SAMPLE.replace(r#"'^[A-Z]{2,}-\d+$'"#, "'['");
        let err = Playbook::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("does not compile"));
    }

    #[test]
    fn test_threshold_bounds_inclusive() {
        let t = SignalThreshold {
            min: Some(0.3),
            max: Some(0.9),
        };
        assert!(t.satisfied_by(0.3));
        assert!(t.satisfied_by(0.9));
        assert!(!t.satisfied_by(0.29));
        assert!(!t.satisfied_by(0.91));
    }

    #[test]
    fn test_registry_lookup() {
        let playbook = Playbook::from_yaml(SAMPLE).unwrap();
        let registry = PlaybookRegistry::from_playbooks([playbook]).unwrap();
        assert!(registry.get("add_negative_keywords").is_ok());
        let err = registry.get("UNSUPPORTED_ACTION_XYZ").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownActionType(_)));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let a = Playbook::from_yaml(SAMPLE).unwrap();
        let b = Playbook::from_yaml(SAMPLE).unwrap();
        let err = PlaybookRegistry::from_playbooks([a, b]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_registry_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("negatives.yaml"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = PlaybookRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.action_types().count(), 1);
        assert!(registry.get("add_negative_keywords").is_ok());
    }
}
