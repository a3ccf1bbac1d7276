//! Rollback payload construction and out-of-band reversal.
//!
//! The engine captures a payload after every successful auto-execution whose
//! playbook supports rollback. Reversal is advisory tooling invoked by an
//! operator or a higher-level recovery process, never by the engine itself.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use remedy_core::{ActionParams, ActionProposal, AppliedChange, Playbook, RollbackPayload};
use std::sync::Arc;

use crate::error::RollbackError;
use crate::executor::NegativeKeywordExecutor;

/// Result of one reversal.
#[derive(Debug, Clone)]
pub struct RollbackReport {
    pub success: bool,
    /// Changes actually reversed.
    pub reversed: Vec<AppliedChange>,
}

/// Build a rollback payload for a successful execution, verifying the
/// playbook's declared required-field set.
pub fn build_rollback_payload(
    playbook: &Playbook,
    proposal: &ActionProposal,
    params: &ActionParams,
    applied: &[AppliedChange],
) -> Result<RollbackPayload, RollbackError> {
    if !playbook.rollback.supported {
        return Err(RollbackError::Unsupported(proposal.action_type.clone()));
    }
    let method = playbook
        .rollback
        .method
        .clone()
        .ok_or_else(|| RollbackError::Unsupported(proposal.action_type.clone()))?;

    let created_at = Utc::now();
    let payload = RollbackPayload {
        action_id: proposal.proposal_id.to_string(),
        method,
        campaign_id: params.scope.campaign_id.clone(),
        ad_group_id: params.scope.ad_group_id.clone(),
        changes: applied.to_vec(),
        created_at,
        expires_at: created_at + Duration::days(playbook.rollback.validity_days),
        trace_id: proposal.trace_id.clone(),
        rule_version: proposal.rule_version.clone(),
    };

    for field in &playbook.rollback.payload_required_fields {
        if !payload.contains_field(field) {
            return Err(RollbackError::MissingField(field.clone()));
        }
    }

    Ok(payload)
}

/// One reversal function per supported action type.
#[async_trait]
pub trait ActionReverter: Send + Sync {
    /// Reverse a previously executed action. Must reject payloads past their
    /// expiry timestamp.
    async fn revert(&self, payload: &RollbackPayload) -> Result<RollbackReport, RollbackError>;
}

/// Reverses `add_negative_keywords` executions against the executor's
/// campaign store.
pub struct NegativeKeywordReverter {
    executor: Arc<NegativeKeywordExecutor>,
}

impl NegativeKeywordReverter {
    pub fn new(executor: Arc<NegativeKeywordExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ActionReverter for NegativeKeywordReverter {
    async fn revert(&self, payload: &RollbackPayload) -> Result<RollbackReport, RollbackError> {
        let now = Utc::now();
        if payload.is_expired(now) {
            return Err(RollbackError::Expired {
                action_id: payload.action_id.clone(),
                expires_at: payload.expires_at,
            });
        }

        let reversed = self
            .executor
            .remove(&payload.campaign_id, &payload.changes);

        tracing::info!(
            action_id = %payload.action_id,
            campaign_id = %payload.campaign_id,
            reversed = reversed.len(),
            "rollback applied"
        );

        Ok(RollbackReport {
            success: reversed.len() == payload.changes.len(),
            reversed,
        })
    }
}
