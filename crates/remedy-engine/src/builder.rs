//! Proposal construction from diagnostic explanations.

use remedy_core::{
    ActionProposal, EvidenceRef, ExecutionFlags, ExecutionMode, Explanation, PlaybookRegistry,
};
use uuid::Uuid;

use crate::error::EngineError;

/// Builds standardized action proposals from one explanation.
///
/// The builder already applies the flags ceiling to each proposal's
/// execution mode, so inspecting a built proposal reflects the final
/// permitted ceiling rather than the playbook's wish.
pub struct ProposalBuilder<'a> {
    registry: &'a PlaybookRegistry,
    flags: &'a ExecutionFlags,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new(registry: &'a PlaybookRegistry, flags: &'a ExecutionFlags) -> Self {
        Self { registry, flags }
    }

    /// Build one proposal per recommended action, preserving the
    /// explanation's action order.
    ///
    /// Cause selection: every proposal references the *first* cause in the
    /// explanation's list. This is a simplifying placeholder policy, not a
    /// ranking; the diagnostic producer orders causes by its own
    /// preference, and per-action cause attribution is an open question on
    /// the producer side.
    pub fn build(&self, explanation: &Explanation) -> Result<Vec<ActionProposal>, EngineError> {
        let cause = explanation
            .causes
            .first()
            .ok_or_else(|| EngineError::NoCause(explanation.observation_id.clone()))?;

        let evidence_refs: Vec<EvidenceRef> = explanation
            .evidence
            .get(&cause.cause_id)
            .map(|items| {
                items
                    .iter()
                    .map(|item| EvidenceRef {
                        cause_id: cause.cause_id.clone(),
                        name: item.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut proposals = Vec::with_capacity(explanation.recommended_actions.len());
        for recommendation in &explanation.recommended_actions {
            let playbook = self.registry.get(&recommendation.action_type)?;

            let seeded = recommendation.mode.unwrap_or(playbook.default_mode);
            let ceiling = if self.flags.allows_auto(&recommendation.action_type) {
                ExecutionMode::AutoIfSafe
            } else {
                ExecutionMode::SuggestOnly
            };
            let mode = seeded.clamped_to(ceiling);

            if mode != seeded {
                tracing::debug!(
                    action_type = %recommendation.action_type,
                    requested = %seeded,
                    effective = %mode,
                    "execution mode downgraded by flags at construction"
                );
            }

            proposals.push(ActionProposal {
                proposal_id: Uuid::new_v4(),
                trace_id: explanation.trace_id.clone(),
                observation_id: explanation.observation_id.clone(),
                cause_id: cause.cause_id.clone(),
                action_type: recommendation.action_type.clone(),
                rule_version: explanation.rule_version.clone(),
                risk: recommendation.risk,
                mode,
                evidence_refs: evidence_refs.clone(),
            });
        }

        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remedy_core::{
        Confidence, EvidenceItem, Playbook, ProbableCause, RecommendedAction, RiskLevel,
    };
    use std::collections::HashMap;

    const NEGATIVES_PLAYBOOK: &str = r#"
action_type: add_negative_keywords
default_mode: auto_if_safe
eligibility:
  active_profile: balanced
  profiles:
    balanced:
      wasted_spend_ratio: { min: 0.3 }
"#;

    const PAUSE_PLAYBOOK: &str = r#"
action_type: pause_keyword
default_mode: suggest_only
eligibility:
  active_profile: balanced
  profiles:
    balanced:
      wasted_spend_ratio: { min: 0.5 }
"#;

    fn registry() -> PlaybookRegistry {
        PlaybookRegistry::from_playbooks([
            Playbook::from_yaml(NEGATIVES_PLAYBOOK).unwrap(),
            Playbook::from_yaml(PAUSE_PLAYBOOK).unwrap(),
        ])
        .unwrap()
    }

    fn flags(allow: &[&str]) -> ExecutionFlags {
        let mut flags = ExecutionFlags::default();
        flags.auto_execution.allow_actions = allow.iter().map(|s| s.to_string()).collect();
        flags
    }

    fn explanation() -> Explanation {
        Explanation {
            observation_id: "obs_1".to_string(),
            trace_id: "trace_1".to_string(),
            rule_version: "wasted_spend_v2".to_string(),
            causes: vec![
                ProbableCause {
                    cause_id: "poor_search_terms".to_string(),
                    description: None,
                    confidence: Confidence::High,
                },
                ProbableCause {
                    cause_id: "broad_match_drift".to_string(),
                    description: None,
                    confidence: Confidence::Medium,
                },
            ],
            evidence: HashMap::from([(
                "poor_search_terms".to_string(),
                vec![
                    EvidenceItem {
                        name: "wasted_spend_ratio".to_string(),
                        value: serde_json::json!(0.42),
                        source: "search_terms_report".to_string(),
                        confidence: Confidence::High,
                    },
                    EvidenceItem {
                        name: "zero_conversion_clicks".to_string(),
                        value: serde_json::json!(310),
                        source: "search_terms_report".to_string(),
                        confidence: Confidence::High,
                    },
                ],
            )]),
            recommended_actions: vec![
                RecommendedAction {
                    action_type: "add_negative_keywords".to_string(),
                    risk: RiskLevel::Medium,
                    mode: None,
                },
                RecommendedAction {
                    action_type: "pause_keyword".to_string(),
                    risk: RiskLevel::High,
                    mode: None,
                },
            ],
        }
    }

    #[test]
    fn test_one_proposal_per_action_in_order() {
        let registry = registry();
        let flags = flags(&["add_negative_keywords", "pause_keyword"]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let proposals = builder.build(&explanation()).unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].action_type, "add_negative_keywords");
        assert_eq!(proposals[1].action_type, "pause_keyword");
    }

    #[test]
    fn test_first_cause_and_its_evidence_only() {
        let registry = registry();
        let flags = flags(&["add_negative_keywords", "pause_keyword"]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let proposals = builder.build(&explanation()).unwrap();
        for proposal in &proposals {
            assert_eq!(proposal.cause_id, "poor_search_terms");
            assert_eq!(proposal.evidence_refs.len(), 2);
            assert!(proposal
                .evidence_refs
                .iter()
                .all(|r| r.cause_id == "poor_search_terms"));
        }
    }

    #[test]
    fn test_mode_seeded_from_playbook_default() {
        let registry = registry();
        let flags = flags(&["add_negative_keywords", "pause_keyword"]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let proposals = builder.build(&explanation()).unwrap();
        assert_eq!(proposals[0].mode, ExecutionMode::AutoIfSafe);
        // pause_keyword's playbook defaults to suggest_only.
        assert_eq!(proposals[1].mode, ExecutionMode::SuggestOnly);
    }

    #[test]
    fn test_recommendation_mode_takes_precedence_but_is_clamped() {
        let registry = registry();
        let flags = flags(&["add_negative_keywords"]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let mut exp = explanation();
        exp.recommended_actions[1].mode = Some(ExecutionMode::AutoIfSafe);

        let proposals = builder.build(&exp).unwrap();
        // pause_keyword is off the auto allow-list: AutoIfSafe is clamped.
        assert_eq!(proposals[1].mode, ExecutionMode::SuggestOnly);
    }

    #[test]
    fn test_auto_disabled_clamps_everything() {
        let registry = registry();
        let mut flags = flags(&["add_negative_keywords", "pause_keyword"]);
        flags.auto_execution.enabled = false;
        let builder = ProposalBuilder::new(&registry, &flags);

        let proposals = builder.build(&explanation()).unwrap();
        assert!(proposals
            .iter()
            .all(|p| p.mode == ExecutionMode::SuggestOnly));
    }

    #[test]
    fn test_unknown_action_type_is_config_error() {
        let registry = registry();
        let flags = flags(&[]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let mut exp = explanation();
        exp.recommended_actions.push(RecommendedAction {
            action_type: "UNSUPPORTED_ACTION_XYZ".to_string(),
            risk: RiskLevel::Low,
            mode: None,
        });

        let err = builder.build(&exp).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_empty_cause_list_rejected() {
        let registry = registry();
        let flags = flags(&[]);
        let builder = ProposalBuilder::new(&registry, &flags);

        let mut exp = explanation();
        exp.causes.clear();
        let err = builder.build(&exp).unwrap_err();
        assert!(matches!(err, EngineError::NoCause(_)));
    }
}
