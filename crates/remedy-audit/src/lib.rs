//! # remedy-audit
//!
//! Append-only outcome events for the Remedy action pipeline.
//!
//! Every terminal decision the execution engine reaches (executed,
//! simulated, suggested, blocked, or denied) produces exactly one
//! [`OutcomeEvent`]. The pipeline only appends; it never reads or mutates
//! past events.
//!
//! ## Event format
//!
//! - **File output**: JSON Lines (one JSON object per line)
//! - **Console output**: human-readable log lines
//!
//! ## Terminal statuses
//!
//! | Status | `success` | Meaning |
//! |--------|-----------|---------|
//! | `AutoExecuted` | `true`/`false` | executor invoked, result captured |
//! | `DryRun` | `null` | fully evaluated, execution simulated |
//! | `SuggestOnly` | `null` | parameters returned for manual application |
//! | `Blocked` | `null` | safety limits breached |
//! | `DenyUnsupportedAction` | `null` | action type outside the allow-list |
//! | `DenyReadonlyEnv` | `null` | read-only environment |

pub mod error;
pub mod event;
pub mod recorder;
pub mod sink;

pub use error::AuditError;
pub use event::{OutcomeEvent, OutcomeEventBuilder, OutcomeStatus};
pub use recorder::OutcomeRecorder;
pub use sink::{ConsoleSink, DualSink, FileSink, MemorySink, NullSink, OutcomeSink};
