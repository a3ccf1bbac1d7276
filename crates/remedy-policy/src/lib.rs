//! Remedy policy checks.
//!
//! Two independent gates sit between a built proposal and execution:
//!
//! 1. **Eligibility** ([`EligibilityEvaluator`]): whether live signals
//!    justify *automatic* execution, evaluated against a named threshold
//!    profile from the playbook. Failing eligibility degrades a proposal to
//!    a suggestion; it never blocks the run.
//! 2. **Safety limits** ([`SafetyLimiter`]): hard bounds on the *shape* of
//!    the concrete parameters (counts, caps, forbidden patterns, lengths,
//!    sub-types). Failing safety blocks the run.
//!
//! A proposal can be eligible yet unsafe, or ineligible and still checked
//! for safety as a secondary signal; the two gates share no state.

pub mod eligibility;
pub mod error;
pub mod safety;

pub use eligibility::{EligibilityEvaluator, EligibilityResult};
pub use error::{SafetyViolation, SafetyViolationKind};
pub use safety::{SafetyLimiter, SafetyResult};
