//! Safety violation types.
//!
//! A violation names both the category of the breached limit and a
//! human-readable message suitable for an operator-facing audit note.
//! Violations are values, not errors: the limiter collects every applicable
//! one instead of failing on the first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single breached safety limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyViolation {
    /// The category of the violation.
    pub kind: SafetyViolationKind,
    /// Human-readable description.
    pub message: String,
}

impl SafetyViolation {
    /// Create a new violation.
    pub fn new(kind: SafetyViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a per-run limit violation.
    pub fn per_run_limit_exceeded(count: usize, max: u64) -> Self {
        Self::new(
            SafetyViolationKind::PerRunLimitExceeded,
            format!(
                "{} items requested in a single run, exceeding the per-run limit of {}",
                count, max
            ),
        )
    }

    /// Create a daily cap violation.
    pub fn daily_cap_exceeded(applied_today: u64, requested: usize, max: u64) -> Self {
        Self::new(
            SafetyViolationKind::DailyCapExceeded,
            format!(
                "{} items already applied today plus {} requested exceeds the daily cap of {}",
                applied_today, requested, max
            ),
        )
    }

    /// Create a brand-term violation.
    pub fn brand_term_match(text: &str, term: &str) -> Self {
        Self::new(
            SafetyViolationKind::BrandTermMatch,
            format!("item '{}' contains the protected brand term '{}'", text, term),
        )
    }

    /// Create an identifier-pattern violation.
    pub fn identifier_pattern_match(text: &str, pattern: &str) -> Self {
        Self::new(
            SafetyViolationKind::IdentifierPatternMatch,
            format!(
                "item '{}' matches the identifier pattern '{}'",
                text, pattern
            ),
        )
    }

    /// Create a minimum-length violation.
    pub fn item_too_short(text: &str, min: usize) -> Self {
        Self::new(
            SafetyViolationKind::ItemTooShort,
            format!(
                "item '{}' is shorter than the minimum length of {} characters",
                text, min
            ),
        )
    }

    /// Create a sub-type allow-list violation.
    pub fn variant_not_allowed(variant: &str, allowed: &[String]) -> Self {
        Self::new(
            SafetyViolationKind::VariantNotAllowed,
            format!(
                "item sub-type '{}' is not in the allowed set [{}]",
                variant,
                allowed.join(", ")
            ),
        )
    }
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Categories of safety violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyViolationKind {
    /// More items in one run than `max_items_per_run` allows.
    PerRunLimitExceeded,
    /// Cumulative daily item count would exceed `max_items_per_day`.
    DailyCapExceeded,
    /// Item text contains a protected brand term.
    BrandTermMatch,
    /// Item text matches an identifier-shaped pattern.
    IdentifierPatternMatch,
    /// Item text is shorter than `min_item_length`.
    ItemTooShort,
    /// Item sub-type is outside the allowed set.
    VariantNotAllowed,
}
