//! Remedy execution engine.
//!
//! Orchestrates the path from a diagnostic explanation to a governed,
//! auditable, optionally-automatic corrective action:
//!
//! 1. [`ProposalBuilder`] converts an explanation into standardized action
//!    proposals, one per recommended action, with the execution mode already
//!    clamped by the current flags.
//! 2. [`ExecutionEngine`] runs the fixed-order gate sequence (allow-list,
//!    read-only, mode, eligibility, safety, dry-run) and produces exactly
//!    one terminal [`ExecutionStatus`] plus one outcome event per proposal.
//! 3. The rollback module captures a self-contained payload on successful
//!    execution and exposes out-of-band reversal per action type.
//!
//! The engine holds no proposal-scoped mutable state; proposals may be
//! evaluated concurrently against a shared `Arc<PlaybookRegistry>`.

pub mod builder;
pub mod engine;
pub mod error;
pub mod executor;
pub mod rollback;

pub use builder::ProposalBuilder;
pub use engine::{EvaluationOverrides, ExecutionEngine, ExecutionStatus};
pub use error::{EngineError, RollbackError};
pub use executor::{ActionExecutor, ExecutionOutcome, ExecutorRegistry, NegativeKeywordExecutor};
pub use rollback::{ActionReverter, NegativeKeywordReverter, RollbackReport, build_rollback_payload};
