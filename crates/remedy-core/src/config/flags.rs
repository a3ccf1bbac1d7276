//! Process-wide execution flags.
//!
//! Flags are the final authority over a proposal's effective execution mode:
//! they can force any proposal's mode downward, never upward. The read-only
//! switch supports an environment-variable override (`REMEDY_READONLY`) with
//! documented precedence: explicit override > structural config > default
//! false. Precedence is resolved once at snapshot construction, not per
//! evaluation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Name of the environment variable overriding the read-only switch.
pub const READONLY_ENV_VAR: &str = "REMEDY_READONLY";

/// Immutable per-run snapshot of the execution flags.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionFlags {
    /// Global read-only switch. When set, every evaluation terminates in
    /// `DENY_READONLY_ENV`.
    #[serde(default)]
    pub readonly: bool,

    /// Automatic-execution gate and allow-list.
    #[serde(default)]
    pub auto_execution: AutoExecutionFlags,

    /// Dry-run gate, enabled by default.
    #[serde(default)]
    pub dry_run: DryRunFlags,

    /// Upper bound on a single executor invocation, in seconds.
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
}

/// Auto-execution flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoExecutionFlags {
    /// Master enable/disable for automatic execution.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Action types permitted to run through this pipeline at all. This is a
    /// hard allow-list: action types outside it are denied regardless of
    /// execution mode.
    #[serde(default)]
    pub allow_actions: Vec<String>,
}

impl Default for AutoExecutionFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_actions: Vec::new(),
        }
    }
}

/// Dry-run flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunFlags {
    /// When set, eligible-and-safe proposals are simulated instead of
    /// executed. Defaults to enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for DryRunFlags {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ExecutionFlags {
    /// Parse flags from YAML content. No environment overrides are applied.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load flags from a YAML file. No environment overrides are applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load flags from a YAML file and fold in the process environment.
    pub fn snapshot_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let flags = Self::from_file(path)?;
        Ok(flags.with_readonly_override(std::env::var(READONLY_ENV_VAR).ok().as_deref()))
    }

    /// Apply the read-only environment override, if one is present and
    /// parseable. An unparseable value keeps the structural setting.
    pub fn with_readonly_override(mut self, env_value: Option<&str>) -> Self {
        if let Some(forced) = env_value.and_then(parse_bool) {
            self.readonly = forced;
        }
        self
    }

    /// Whether the action type is on the hard allow-list. Applies to every
    /// execution mode, including `suggest_only`.
    pub fn is_action_allowed(&self, action_type: &str) -> bool {
        self.auto_execution
            .allow_actions
            .iter()
            .any(|a| a == action_type)
    }

    /// Whether the action type may hold the `auto_if_safe` mode under these
    /// flags. Used to clamp a proposal's mode ceiling at construction time.
    pub fn allows_auto(&self, action_type: &str) -> bool {
        self.auto_execution.enabled && self.is_action_allowed(action_type)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_true() -> bool {
    true
}

fn default_execution_timeout_secs() -> u64 {
    30
}
