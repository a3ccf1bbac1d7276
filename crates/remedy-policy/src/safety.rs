//! Safety-limit validation of concrete action parameters.
//!
//! Safety is about the *shape* of a change, independent of whether the
//! context warrants automating it. All applicable checks run even after the
//! first violation, so operators see the full violation set rather than just
//! the first.

use crate::error::SafetyViolation;
use remedy_core::{ActionParams, CumulativeState, SafetyLimits};
use serde::{Deserialize, Serialize};

/// Result of a safety check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyResult {
    /// Whether the parameters are within every hard bound.
    pub safe: bool,
    /// Itemized violations. Empty iff `safe`.
    pub violations: Vec<SafetyViolation>,
}

/// Validates action parameters against a playbook's hard safety limits.
pub struct SafetyLimiter<'a> {
    /// The safety limits to validate against.
    limits: &'a SafetyLimits,
    /// Identifier patterns compiled once at construction, paired with their
    /// source text for violation messages.
    identifier_patterns: Vec<(regex::Regex, &'a str)>,
}

impl<'a> SafetyLimiter<'a> {
    /// Create a new limiter over a playbook's safety limits.
    ///
    /// Patterns are validated at playbook load; an invalid one here means
    /// the limits were constructed by hand, and it is skipped with a warn.
    pub fn new(limits: &'a SafetyLimits) -> Self {
        let identifier_patterns = limits
            .identifier_patterns
            .iter()
            .filter_map(|pattern| match regex::Regex::new(pattern) {
                Ok(re) => Some((re, pattern.as_str())),
                Err(_) => {
                    tracing::warn!("invalid identifier pattern skipped: {}", pattern);
                    None
                }
            })
            .collect();

        Self {
            limits,
            identifier_patterns,
        }
    }

    /// Check parameters and caller-supplied cumulative state against every
    /// limit. Checks never short-circuit.
    pub fn check(&self, params: &ActionParams, state: &CumulativeState) -> SafetyResult {
        let mut violations = Vec::new();

        self.check_counts(params, state, &mut violations);
        for item in &params.items {
            self.check_item(&item.text, &item.variant, &mut violations);
        }

        tracing::debug!(
            campaign_id = %params.scope.campaign_id,
            items = params.items.len(),
            violations = violations.len(),
            "safety limits checked"
        );

        SafetyResult {
            safe: violations.is_empty(),
            violations,
        }
    }

    fn check_counts(
        &self,
        params: &ActionParams,
        state: &CumulativeState,
        violations: &mut Vec<SafetyViolation>,
    ) {
        let requested = params.items.len();

        if requested as u64 > self.limits.max_items_per_run {
            violations.push(SafetyViolation::per_run_limit_exceeded(
                requested,
                self.limits.max_items_per_run,
            ));
        }

        if state.items_applied_today + requested as u64 > self.limits.max_items_per_day {
            violations.push(SafetyViolation::daily_cap_exceeded(
                state.items_applied_today,
                requested,
                self.limits.max_items_per_day,
            ));
        }
    }

    fn check_item(&self, text: &str, variant: &str, violations: &mut Vec<SafetyViolation>) {
        if text.chars().count() < self.limits.min_item_length {
            violations.push(SafetyViolation::item_too_short(
                text,
                self.limits.min_item_length,
            ));
        }

        let lowered = text.to_lowercase();
        for term in &self.limits.brand_terms {
            if lowered.contains(&term.to_lowercase()) {
                violations.push(SafetyViolation::brand_term_match(text, term));
            }
        }

        for (re, pattern) in &self.identifier_patterns {
            if re.is_match(text) {
                violations.push(SafetyViolation::identifier_pattern_match(text, pattern));
            }
        }

        if !self.limits.allowed_variants.is_empty()
            && !self.limits.allowed_variants.iter().any(|v| v == variant)
        {
            violations.push(SafetyViolation::variant_not_allowed(
                variant,
                &self.limits.allowed_variants,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SafetyViolationKind;
    use remedy_core::{ActionItem, TargetScope};

    fn limits() -> SafetyLimits {
        SafetyLimits {
            max_items_per_run: 10,
            max_items_per_day: 50,
            min_item_length: 3,
            brand_terms: vec!["Acme".to_string()],
            identifier_patterns: vec![r"^[A-Z]{2,}-\d+$".to_string()],
            allowed_variants: vec!["exact".to_string(), "phrase".to_string()],
        }
    }

    fn params(items: Vec<(&str, &str)>) -> ActionParams {
        ActionParams {
            scope: TargetScope {
                campaign_id: "cmp_42".to_string(),
                ad_group_id: None,
            },
            items: items
                .into_iter()
                .map(|(text, variant)| ActionItem {
                    text: text.to_string(),
                    variant: variant.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_safe_parameters() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(
            &params(vec![("free stuff", "exact"), ("cheap clone", "phrase")]),
            &CumulativeState::default(),
        );
        assert!(result.safe);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_per_run_limit() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let items: Vec<(&str, &str)> = (0..15).map(|_| ("free stuff", "exact")).collect();
        let result = limiter.check(&params(items), &CumulativeState::default());
        assert!(!result.safe);
        assert!(result
            .violations
            .iter()
            .any(|v| v.kind == SafetyViolationKind::PerRunLimitExceeded));
        let msg = &result
            .violations
            .iter()
            .find(|v| v.kind == SafetyViolationKind::PerRunLimitExceeded)
            .unwrap()
            .message;
        assert!(msg.contains("per-run limit of 10"));
    }

    #[test]
    fn test_daily_cap_uses_caller_state() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let state = CumulativeState {
            items_applied_today: 48,
        };
        let result = limiter.check(&params(vec![("free stuff", "exact"); 3]), &state);
        assert!(!result.safe);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].kind,
            SafetyViolationKind::DailyCapExceeded
        );
    }

    #[test]
    fn test_brand_term_case_insensitive() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(
            &params(vec![("ACME widgets", "exact")]),
            &CumulativeState::default(),
        );
        assert!(!result.safe);
        assert_eq!(
            result.violations[0].kind,
            SafetyViolationKind::BrandTermMatch
        );
        assert!(result.violations[0].message.contains("Acme"));
    }

    #[test]
    fn test_identifier_shaped_text() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(
            &params(vec![("SKU-12345", "exact")]),
            &CumulativeState::default(),
        );
        assert!(!result.safe);
        assert_eq!(
            result.violations[0].kind,
            SafetyViolationKind::IdentifierPatternMatch
        );
    }

    #[test]
    fn test_min_length() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(&params(vec![("ab", "exact")]), &CumulativeState::default());
        assert!(!result.safe);
        assert_eq!(result.violations[0].kind, SafetyViolationKind::ItemTooShort);
    }

    #[test]
    fn test_variant_allow_list() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(
            &params(vec![("free stuff", "broad")]),
            &CumulativeState::default(),
        );
        assert!(!result.safe);
        assert_eq!(
            result.violations[0].kind,
            SafetyViolationKind::VariantNotAllowed
        );
    }

    #[test]
    fn test_hand_built_invalid_pattern_skipped_at_construction() {
        let mut limits = limits();
        limits.identifier_patterns = vec!["[unclosed".to_string(), r"^SKU-\d+$".to_string()];
        let limiter = SafetyLimiter::new(&limits);

        // The invalid pattern is dropped once; the valid one still matches.
        let result = limiter.check(
            &params(vec![("SKU-12345", "exact")]),
            &CumulativeState::default(),
        );
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].kind,
            SafetyViolationKind::IdentifierPatternMatch
        );
    }

    #[test]
    fn test_no_short_circuit_collects_all_violations() {
        let limits = limits();
        let limiter = SafetyLimiter::new(&limits);
        // One item trips length, brand term, and variant checks at once.
        let result = limiter.check(
            &params(vec![("ab", "broad"), ("acme sale", "exact")]),
            &CumulativeState {
                items_applied_today: 49,
            },
        );
        assert!(!result.safe);
        let kinds: Vec<_> = result.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&SafetyViolationKind::DailyCapExceeded));
        assert!(kinds.contains(&SafetyViolationKind::ItemTooShort));
        assert!(kinds.contains(&SafetyViolationKind::VariantNotAllowed));
        assert!(kinds.contains(&SafetyViolationKind::BrandTermMatch));
    }

    #[test]
    fn test_empty_variant_list_allows_everything() {
        let mut limits = limits();
        limits.allowed_variants.clear();
        let limiter = SafetyLimiter::new(&limits);
        let result = limiter.check(
            &params(vec![("free stuff", "broad")]),
            &CumulativeState::default(),
        );
        assert!(result.safe);
    }
}
