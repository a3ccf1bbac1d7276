//! End-to-end walkthrough: explanation in, governed outcome out.
//!
//! Run with `cargo run --example pipeline`. Set `RUST_LOG=debug` to see the
//! gate decisions.

use remedy_audit::OutcomeRecorder;
use remedy_core::{
    ActionItem, ActionParams, Confidence, CumulativeState, EvidenceItem, ExecutionFlags,
    Explanation, Playbook, PlaybookRegistry, ProbableCause, RecommendedAction, RiskLevel,
    TargetScope,
};
use remedy_engine::{
    EvaluationOverrides, ExecutionEngine, ExecutorRegistry, NegativeKeywordExecutor,
    ProposalBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;

const PLAYBOOK: &str = r#"
action_type: add_negative_keywords
default_mode: auto_if_safe
eligibility:
  active_profile: balanced
  profiles:
    balanced:
      wasted_spend_ratio: { min: 0.3 }
safety_limits:
  max_items_per_run: 10
  max_items_per_day: 50
  min_item_length: 3
  brand_terms: [acme]
  identifier_patterns: ['SKU-\d+']
  allowed_variants: [exact, phrase]
rollback:
  supported: true
  method: remove_negative_keywords
  payload_required_fields: [campaign_id, changes, created_at, expires_at, trace_id]
  validity_days: 7
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let registry = Arc::new(PlaybookRegistry::from_playbooks([Playbook::from_yaml(
        PLAYBOOK,
    )?])?);

    let mut flags = ExecutionFlags::default();
    flags.auto_execution.allow_actions = vec!["add_negative_keywords".to_string()];

    let explanation = Explanation {
        observation_id: "obs_cmp_42_week_34".to_string(),
        trace_id: "trace_demo_1".to_string(),
        rule_version: "wasted_spend_v2".to_string(),
        causes: vec![ProbableCause {
            cause_id: "poor_search_terms".to_string(),
            description: Some("spend concentrated on non-converting queries".to_string()),
            confidence: Confidence::High,
        }],
        evidence: HashMap::from([(
            "poor_search_terms".to_string(),
            vec![EvidenceItem {
                name: "wasted_spend_ratio".to_string(),
                value: serde_json::json!(0.42),
                source: "search_terms_report".to_string(),
                confidence: Confidence::High,
            }],
        )]),
        recommended_actions: vec![RecommendedAction {
            action_type: "add_negative_keywords".to_string(),
            risk: RiskLevel::Medium,
            mode: None,
        }],
    };

    let proposals = ProposalBuilder::new(&registry, &flags).build(&explanation)?;

    let executor = Arc::new(NegativeKeywordExecutor::new());
    let mut executors = ExecutorRegistry::new();
    executors.register("add_negative_keywords", executor.clone());

    let engine = ExecutionEngine::new(registry, executors, OutcomeRecorder::console_only());

    let params = ActionParams {
        scope: TargetScope {
            campaign_id: "cmp_42".to_string(),
            ad_group_id: None,
        },
        items: vec![
            ActionItem {
                text: "free stuff".to_string(),
                variant: "exact".to_string(),
            },
            ActionItem {
                text: "cheap knockoff".to_string(),
                variant: "phrase".to_string(),
            },
        ],
    };
    let signals = HashMap::from([("wasted_spend_ratio".to_string(), 0.42)]);

    // First pass: dry-run flag is on by default, nothing is applied.
    for proposal in &proposals {
        let status = engine
            .evaluate(
                proposal,
                &params,
                &signals,
                &CumulativeState::default(),
                &flags,
                &EvaluationOverrides::default(),
            )
            .await?;
        tracing::info!(?status, "dry-run pass");
    }

    // Second pass: dry-run lifted per call, the executor is invoked.
    let live = EvaluationOverrides {
        dry_run: Some(false),
        ..Default::default()
    };
    for proposal in &proposals {
        let status = engine
            .evaluate(
                proposal,
                &params,
                &signals,
                &CumulativeState::default(),
                &flags,
                &live,
            )
            .await?;
        tracing::info!(?status, "live pass");
    }

    tracing::info!(
        applied = executor.applied_to("cmp_42").len(),
        "negatives now on campaign cmp_42"
    );

    Ok(())
}
