//! Eligibility evaluation against named threshold profiles.
//!
//! Eligibility decides whether live signals justify *automatic* execution of
//! a proposal. Only `auto_if_safe` proposals are evaluated; any other mode
//! is ineligible by definition, with a reason naming the actual mode.
//! Every threshold in the active profile must hold simultaneously, and a
//! missing required signal is a failure, not a pass.

use remedy_core::{ActionProposal, ExecutionMode, Playbook, SignalThreshold};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of an eligibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResult {
    /// Whether automatic execution is permitted.
    pub eligible: bool,
    /// Human-readable failure reasons. Empty iff `eligible`.
    pub reasons: Vec<String>,
}

impl EligibilityResult {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reasons: Vec::new(),
        }
    }

    fn ineligible(reasons: Vec<String>) -> Self {
        Self {
            eligible: false,
            reasons,
        }
    }
}

/// Evaluates eligibility thresholds from a playbook.
pub struct EligibilityEvaluator<'a> {
    /// The playbook governing the proposal's action type.
    playbook: &'a Playbook,
}

impl<'a> EligibilityEvaluator<'a> {
    /// Create a new evaluator over a loaded playbook.
    pub fn new(playbook: &'a Playbook) -> Self {
        Self { playbook }
    }

    /// Evaluate a proposal against live signals.
    ///
    /// `profile_override` selects a profile other than the playbook's
    /// `active_profile`; an unknown override name yields an ineligible
    /// result, never a panic.
    pub fn evaluate(
        &self,
        proposal: &ActionProposal,
        signals: &HashMap<String, f64>,
        profile_override: Option<&str>,
    ) -> EligibilityResult {
        if proposal.mode != ExecutionMode::AutoIfSafe {
            return EligibilityResult::ineligible(vec![format!(
                "execution mode is {}; only auto_if_safe proposals are evaluated for automatic execution",
                proposal.mode
            )]);
        }

        let profile_name =
            profile_override.unwrap_or(&self.playbook.eligibility.active_profile);
        let Some(profile) = self.playbook.profile(profile_name) else {
            return EligibilityResult::ineligible(vec![format!(
                "eligibility profile '{}' is not defined for action type '{}'",
                profile_name, proposal.action_type
            )]);
        };

        let reasons = check_profile(profile, signals);

        tracing::debug!(
            proposal_id = %proposal.proposal_id,
            action_type = %proposal.action_type,
            profile = %profile_name,
            eligible = reasons.is_empty(),
            "eligibility evaluated"
        );

        if reasons.is_empty() {
            EligibilityResult::eligible()
        } else {
            EligibilityResult::ineligible(reasons)
        }
    }
}

/// Check every threshold in a profile against the supplied signals,
/// collecting one reason per unmet threshold.
///
/// Thresholds are visited in signal-name order so repeated evaluation yields
/// identical reasons.
fn check_profile(
    profile: &HashMap<String, SignalThreshold>,
    signals: &HashMap<String, f64>,
) -> Vec<String> {
    let mut names: Vec<&String> = profile.keys().collect();
    names.sort();

    let mut reasons = Vec::new();
    for name in names {
        let threshold = &profile[name];
        match signals.get(name.as_str()) {
            None => reasons.push(format!("required signal '{}' is missing", name)),
            Some(&value) => {
                if let Some(min) = threshold.min {
                    if value < min {
                        reasons.push(format!(
                            "signal '{}' value {} is below the minimum {}",
                            name, value, min
                        ));
                        continue;
                    }
                }
                if let Some(max) = threshold.max {
                    if value > max {
                        reasons.push(format!(
                            "signal '{}' value {} is above the maximum {}",
                            name, value, max
                        ));
                    }
                }
            }
        }
    }
    reasons
}
