//! Executor trait and registry.
//!
//! An executor performs the actual side effect for one action type. The
//! engine decides *whether* and *how* to invoke it; executors never gate
//! themselves. Lookup failure is treated as `DENY_UNSUPPORTED_ACTION`
//! upstream, never as a crash.

use async_trait::async_trait;
use remedy_core::{ActionParams, ActionProposal, AppliedChange};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// What an executor returns on success: the concrete changes applied (with
/// enough detail to reverse them) plus free-form detail for the audit trail.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub applied: Vec<AppliedChange>,
    pub detail: serde_json::Value,
}

/// Side-effecting executor for one action type.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Apply validated parameters. The engine bounds this call with a
    /// timeout; implementations should still keep it short-lived.
    async fn execute(
        &self,
        proposal: &ActionProposal,
        params: &ActionParams,
    ) -> anyhow::Result<ExecutionOutcome>;
}

/// Executors registered per action type identifier.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn ActionExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor for an action type, replacing any previous one.
    pub fn register(&mut self, action_type: impl Into<String>, executor: Arc<dyn ActionExecutor>) {
        self.executors.insert(action_type.into(), executor);
    }

    /// Look up the executor for an action type.
    pub fn get(&self, action_type: &str) -> Option<Arc<dyn ActionExecutor>> {
        self.executors.get(action_type).cloned()
    }
}

/// Illustrative executor for the `add_negative_keywords` action type.
///
/// Applies negatives to an in-memory campaign store. This stands in for a
/// campaign-management API client so the pipeline design can be validated
/// end to end; the store doubles as the reversal target for
/// [`crate::NegativeKeywordReverter`].
pub struct NegativeKeywordExecutor {
    applied: RwLock<HashMap<String, Vec<AppliedChange>>>,
    fail_with: Option<String>,
    delay: Option<std::time::Duration>,
}

impl NegativeKeywordExecutor {
    pub fn new() -> Self {
        Self {
            applied: RwLock::new(HashMap::new()),
            fail_with: None,
            delay: None,
        }
    }

    /// An executor that fails every invocation with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new()
        }
    }

    /// An executor that sleeps before applying, to exercise the engine's
    /// timeout bound.
    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Negatives currently applied to a campaign.
    pub fn applied_to(&self, campaign_id: &str) -> Vec<AppliedChange> {
        self.applied
            .read()
            .ok()
            .and_then(|m| m.get(campaign_id).cloned())
            .unwrap_or_default()
    }

    /// Remove previously applied changes from a campaign, returning the ones
    /// that were actually present.
    pub fn remove(&self, campaign_id: &str, changes: &[AppliedChange]) -> Vec<AppliedChange> {
        let mut removed = Vec::new();
        if let Ok(mut map) = self.applied.write() {
            if let Some(existing) = map.get_mut(campaign_id) {
                for change in changes {
                    if let Some(pos) = existing.iter().position(|c| c == change) {
                        existing.remove(pos);
                        removed.push(change.clone());
                    }
                }
            }
        }
        removed
    }
}

impl Default for NegativeKeywordExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionExecutor for NegativeKeywordExecutor {
    async fn execute(
        &self,
        proposal: &ActionProposal,
        params: &ActionParams,
    ) -> anyhow::Result<ExecutionOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }

        let changes: Vec<AppliedChange> = params
            .items
            .iter()
            .map(|item| AppliedChange {
                text: item.text.clone(),
                variant: item.variant.clone(),
            })
            .collect();

        self.applied
            .write()
            .map_err(|e| anyhow::anyhow!("campaign store lock poisoned: {}", e))?
            .entry(params.scope.campaign_id.clone())
            .or_default()
            .extend(changes.clone());

        tracing::info!(
            proposal_id = %proposal.proposal_id,
            campaign_id = %params.scope.campaign_id,
            count = changes.len(),
            "negative keywords applied"
        );

        Ok(ExecutionOutcome {
            detail: serde_json::json!({
                "campaign_id": params.scope.campaign_id,
                "applied_count": changes.len(),
            }),
            applied: changes,
        })
    }
}
