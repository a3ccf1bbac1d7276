//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the outcome/audit sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether outcome recording is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether to mirror events to stdout in addition to the file sink.
    #[serde(default)]
    pub stdout: bool,

    /// Directory holding the append-only outcome log.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            directory: default_directory(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> String {
    "audit".to_string()
}
