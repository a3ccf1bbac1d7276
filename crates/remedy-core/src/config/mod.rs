//! Configuration types for the Remedy action pipeline.
//!
//! Two configuration surfaces exist, both loaded from YAML at process start:
//!
//! - **Playbooks** (`playbooks/*.yaml`): one per action type, carrying
//!   eligibility profiles, safety limits, selection policy, and the rollback
//!   contract. Loaded into a read-only [`PlaybookRegistry`].
//! - **Execution flags** (`flags.yaml`): the process-wide kill switch,
//!   auto-execution allow-list, and dry-run default. Resolved once into an
//!   immutable snapshot per run.
//!
//! Malformed configuration is rejected at load time, never at evaluation
//! time.

pub mod audit;
pub mod flags;
pub mod playbook;

pub use audit::AuditConfig;
pub use flags::{AutoExecutionFlags, DryRunFlags, ExecutionFlags};
pub use playbook::{
    EligibilityConfig, Playbook, PlaybookRegistry, RollbackContract, SafetyLimits,
    SelectionPolicy, SignalThreshold,
};

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no playbook registered for action type '{0}'")]
    UnknownActionType(String),
}
