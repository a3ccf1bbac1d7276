//! The orchestrating execution state machine.
//!
//! Gates run in a fixed order, each short-circuiting to exactly one terminal
//! status: allow-list, read-only environment, execution mode, eligibility,
//! safety, dry-run, execution. Every terminal status appends exactly one
//! outcome event, denials included.

use remedy_audit::{OutcomeEvent, OutcomeRecorder, OutcomeStatus};
use remedy_core::{
    ActionItem, ActionParams, ActionProposal, AppliedChange, CumulativeState, ExecutionFlags,
    ExecutionMode, PlaybookRegistry, RollbackPayload,
};
use remedy_policy::{EligibilityEvaluator, SafetyLimiter, SafetyViolation};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::EngineError;
use crate::executor::ExecutorRegistry;
use crate::rollback::build_rollback_payload;

/// Terminal result of one proposal evaluation.
///
/// Mutually exclusive; each variant carries only the data relevant to it.
#[derive(Debug, Clone)]
pub enum ExecutionStatus {
    /// The executor was invoked. `success` captures its result; `rollback`
    /// is present on success when the playbook supports reversal and the
    /// payload satisfied its required fields (a capture failure lands in
    /// `error` instead).
    AutoExecuted {
        success: bool,
        applied: Vec<AppliedChange>,
        rollback: Option<RollbackPayload>,
        error: Option<String>,
    },
    /// Fully evaluated and simulated; no side effects.
    DryRun { would_apply: Vec<ActionItem> },
    /// Parameters returned for manual application; no side effects.
    SuggestOnly {
        params: ActionParams,
        reasons: Vec<String>,
    },
    /// Safety limits breached; the shape of the change is dangerous.
    Blocked { violations: Vec<SafetyViolation> },
    /// Action type outside the hard allow-list, or no executor registered.
    DenyUnsupportedAction { reason: String },
    /// Read-only environment.
    DenyReadonlyEnv,
}

impl ExecutionStatus {
    /// The flat status label recorded on the outcome event.
    pub fn outcome_status(&self) -> OutcomeStatus {
        match self {
            Self::AutoExecuted { .. } => OutcomeStatus::AutoExecuted,
            Self::DryRun { .. } => OutcomeStatus::DryRun,
            Self::SuggestOnly { .. } => OutcomeStatus::SuggestOnly,
            Self::Blocked { .. } => OutcomeStatus::Blocked,
            Self::DenyUnsupportedAction { .. } => OutcomeStatus::DenyUnsupportedAction,
            Self::DenyReadonlyEnv => OutcomeStatus::DenyReadonlyEnv,
        }
    }
}

/// Per-call overrides. Every field defaults to "use the flags snapshot".
#[derive(Debug, Clone, Default)]
pub struct EvaluationOverrides {
    /// Force or lift read-only for this evaluation.
    pub readonly: Option<bool>,
    /// Force or skip dry-run for this evaluation.
    pub dry_run: Option<bool>,
    /// Evaluate against a profile other than the playbook's active one.
    pub profile: Option<String>,
}

/// The execution engine.
///
/// Holds no proposal-scoped mutable state; one engine may evaluate many
/// proposals concurrently against its shared read-only registry.
pub struct ExecutionEngine {
    registry: Arc<PlaybookRegistry>,
    executors: ExecutorRegistry,
    recorder: OutcomeRecorder,
}

impl ExecutionEngine {
    pub fn new(
        registry: Arc<PlaybookRegistry>,
        executors: ExecutorRegistry,
        recorder: OutcomeRecorder,
    ) -> Self {
        Self {
            registry,
            executors,
            recorder,
        }
    }

    /// Evaluate one proposal to a terminal status and record the outcome.
    ///
    /// The proposal's mode and identifiers are frozen on entry; the flags
    /// snapshot is the final authority and is checked before anything else.
    /// Exactly one outcome event is appended per call, whatever the status.
    pub async fn evaluate(
        &self,
        proposal: &ActionProposal,
        params: &ActionParams,
        signals: &HashMap<String, f64>,
        state: &CumulativeState,
        flags: &ExecutionFlags,
        overrides: &EvaluationOverrides,
    ) -> Result<ExecutionStatus, EngineError> {
        let (status, duration_ms) = self
            .decide(proposal, params, signals, state, flags, overrides)
            .await?;

        let event = outcome_event(proposal, &status, duration_ms)?;
        self.recorder.record(event).await?;

        tracing::info!(
            proposal_id = %proposal.proposal_id,
            action_type = %proposal.action_type,
            status = %status.outcome_status(),
            "evaluation complete"
        );

        Ok(status)
    }

    async fn decide(
        &self,
        proposal: &ActionProposal,
        params: &ActionParams,
        signals: &HashMap<String, f64>,
        state: &CumulativeState,
        flags: &ExecutionFlags,
        overrides: &EvaluationOverrides,
    ) -> Result<(ExecutionStatus, Option<u64>), EngineError> {
        // 1. Hard allow-list, applies to every mode. Executor lookup failure
        //    lands here too rather than crashing later.
        if !flags.is_action_allowed(&proposal.action_type) {
            return Ok((
                ExecutionStatus::DenyUnsupportedAction {
                    reason: format!(
                        "action type '{}' is not in the auto_execution allow-list",
                        proposal.action_type
                    ),
                },
                None,
            ));
        }
        let Some(executor) = self.executors.get(&proposal.action_type) else {
            return Ok((
                ExecutionStatus::DenyUnsupportedAction {
                    reason: format!(
                        "no executor registered for action type '{}'",
                        proposal.action_type
                    ),
                },
                None,
            ));
        };

        // 2. Read-only environment: explicit override, else the snapshot
        //    (which already folded in the env var).
        if overrides.readonly.unwrap_or(flags.readonly) {
            return Ok((ExecutionStatus::DenyReadonlyEnv, None));
        }

        let playbook = self.registry.get(&proposal.action_type)?;

        // 3. Suggest-only proposals return their parameters untouched.
        if proposal.mode == ExecutionMode::SuggestOnly {
            return Ok((
                ExecutionStatus::SuggestOnly {
                    params: params.clone(),
                    reasons: vec![
                        "execution mode is suggest_only; parameters returned for manual application"
                            .to_string(),
                    ],
                },
                None,
            ));
        }

        // 4. Ineligibility degrades to a suggestion, never to a block.
        let eligibility = EligibilityEvaluator::new(playbook).evaluate(
            proposal,
            signals,
            overrides.profile.as_deref(),
        );
        if !eligibility.eligible {
            return Ok((
                ExecutionStatus::SuggestOnly {
                    params: params.clone(),
                    reasons: eligibility.reasons,
                },
                None,
            ));
        }

        // 5. Safety is independent of eligibility and blocks the run.
        let safety = SafetyLimiter::new(&playbook.safety_limits).check(params, state);
        if !safety.safe {
            return Ok((
                ExecutionStatus::Blocked {
                    violations: safety.violations,
                },
                None,
            ));
        }

        // 6. Dry-run gate: per-call override, else the flag default.
        if overrides.dry_run.unwrap_or(flags.dry_run.enabled) {
            return Ok((
                ExecutionStatus::DryRun {
                    would_apply: params.items.clone(),
                },
                None,
            ));
        }

        // 7. Execute, time-bounded. A timeout or executor error still yields
        //    a terminal outcome with success = false.
        let timeout = Duration::from_secs(flags.execution_timeout_secs);
        let started = Instant::now();
        let result = tokio::time::timeout(timeout, executor.execute(proposal, params)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let status = match result {
            Err(_) => ExecutionStatus::AutoExecuted {
                success: false,
                applied: Vec::new(),
                rollback: None,
                error: Some(format!(
                    "executor timed out after {}s",
                    flags.execution_timeout_secs
                )),
            },
            Ok(Err(e)) => ExecutionStatus::AutoExecuted {
                success: false,
                applied: Vec::new(),
                rollback: None,
                error: Some(e.to_string()),
            },
            Ok(Ok(outcome)) => {
                // The side effect already happened; a rollback-payload
                // failure must still reach the audit trail as a terminal
                // outcome, not abort the evaluation.
                let (rollback, error) = if playbook.rollback.supported {
                    match build_rollback_payload(playbook, proposal, params, &outcome.applied) {
                        Ok(payload) => (Some(payload), None),
                        Err(e) => {
                            tracing::warn!(
                                proposal_id = %proposal.proposal_id,
                                action_type = %proposal.action_type,
                                error = %e,
                                "executed without a rollback payload"
                            );
                            (None, Some(format!("rollback payload not captured: {}", e)))
                        }
                    }
                } else {
                    (None, None)
                };
                ExecutionStatus::AutoExecuted {
                    success: true,
                    applied: outcome.applied,
                    rollback,
                    error,
                }
            }
        };

        Ok((status, Some(duration_ms)))
    }
}

/// Build the audit record for one terminal status.
fn outcome_event(
    proposal: &ActionProposal,
    status: &ExecutionStatus,
    duration_ms: Option<u64>,
) -> Result<OutcomeEvent, EngineError> {
    let mut builder = OutcomeEvent::builder(
        status.outcome_status(),
        proposal.trace_id.clone(),
        proposal.proposal_id,
        proposal.observation_id.clone(),
        proposal.action_type.clone(),
    );

    if let Some(duration) = duration_ms {
        builder = builder.duration_ms(duration);
    }

    let builder = match status {
        ExecutionStatus::AutoExecuted {
            success,
            applied,
            rollback,
            error,
        } => {
            let mut builder = builder.success(*success);
            if *success {
                builder = builder.note(format!("applied {} items", applied.len()));
            }
            if let Some(error) = error {
                builder = builder.note(error.clone());
            }
            if let Some(payload) = rollback {
                let json = serde_json::to_value(payload)
                    .map_err(remedy_audit::AuditError::Serialization)?;
                builder = builder.rollback(json);
            }
            builder
        }
        ExecutionStatus::DryRun { would_apply } => builder.note(format!(
            "dry run: would apply {} items without side effects",
            would_apply.len()
        )),
        ExecutionStatus::SuggestOnly { reasons, .. } => builder.notes(reasons.clone()),
        ExecutionStatus::Blocked { violations } => {
            builder.notes(violations.iter().map(|v| v.to_string()))
        }
        ExecutionStatus::DenyUnsupportedAction { reason } => builder.note(reason.clone()),
        ExecutionStatus::DenyReadonlyEnv => builder.note("environment is read-only"),
    };

    Ok(builder.build())
}
