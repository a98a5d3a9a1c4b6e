//! Orchestration of rule evaluation, the pending queue, and history.
//!
//! [`DecisionCoordinator`] owns the two public flows:
//!
//! - [`process_action`](DecisionCoordinator::process_action): evaluate a new
//!   action and either record an automatic decision or queue it for review
//! - [`decide_pending`](DecisionCoordinator::decide_pending): record a
//!   reviewer's decision on a queued action
//!
//! plus the expiry sweep, rule seeding and administration, and history reads.
//! Every flow runs inside a `request` span carrying the action id.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;
use tracing::{Instrument, debug, info, warn};

use vigil_audit::{ActionHistoryEntry, AuditStore, HistoryPage};
use vigil_core::{Action, ActionId, ActionSource, Decision, DecisionAction, RuleId, Timestamp};
use vigil_rules::{
    EvaluationResult, NewRule, Rule, RuleEngine, RuleLimits, RuleOutcome, RuleResult, RuleSet,
    RuleStore, RuleUpdate, default_rules, seed_if_empty,
};
use vigil_telemetry::RequestContext;

use crate::error::{ApprovalError, ApprovalResult};
use crate::pending::PendingApproval;
use crate::queue::ApprovalQueue;

/// Coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Lifetime of a queued approval.
    pub ttl: Duration,
    /// Maximum items finalized per sweep. `None` is unlimited.
    pub sweep_batch_limit: Option<usize>,
    /// History entries kept after each sweep. `None` skips pruning.
    pub sweep_retention: Option<usize>,
    /// Limits used when compiling rules.
    pub limits: RuleLimits,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            sweep_batch_limit: None,
            sweep_retention: None,
            limits: RuleLimits::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the approval lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Cap the items finalized per sweep.
    #[must_use]
    pub fn with_sweep_batch_limit(mut self, limit: usize) -> Self {
        self.sweep_batch_limit = Some(limit);
        self
    }

    /// Prune history to `keep` entries after each sweep.
    #[must_use]
    pub fn with_sweep_retention(mut self, keep: usize) -> Self {
        self.sweep_retention = Some(keep);
        self
    }

    /// Set the rule compilation limits.
    #[must_use]
    pub fn with_limits(mut self, limits: RuleLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// What [`DecisionCoordinator::process_action`] did with an action.
///
/// Exactly one of `decision` and `pending` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    /// The automatic decision, already recorded in history.
    pub decision: Option<Decision>,
    /// The queued approval awaiting review.
    pub pending: Option<PendingApproval>,
    /// How the outcome was reached.
    pub evaluation: EvaluationResult,
}

impl ProcessOutcome {
    /// Whether the action is waiting for a reviewer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Runs the decision flows over a rule store, a pending queue, and history.
pub struct DecisionCoordinator {
    rules: Arc<dyn RuleStore>,
    queue: ApprovalQueue,
    audit: Arc<dyn AuditStore>,
    engine: RuleEngine,
    config: CoordinatorConfig,
    compiled: RwLock<Option<Arc<RuleSet>>>,
}

impl DecisionCoordinator {
    /// Create a coordinator. `queue` must append to the same `audit` store.
    #[must_use]
    pub fn new(
        rules: Arc<dyn RuleStore>,
        queue: ApprovalQueue,
        audit: Arc<dyn AuditStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            rules,
            queue,
            audit,
            engine: RuleEngine::new(config.limits),
            config,
            compiled: RwLock::new(None),
        }
    }

    /// The settings in use.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The pending queue.
    #[must_use]
    pub fn queue(&self) -> &ApprovalQueue {
        &self.queue
    }

    // -- Evaluation --

    /// Evaluate an action against the enabled rules without recording
    /// anything.
    ///
    /// Never fails. If the rules cannot be read, the default policy is used
    /// with `auto_approve` raised to `require_approval`.
    pub async fn evaluate_action(&self, source: ActionSource, action: &Action) -> EvaluationResult {
        let span = RequestContext::new("coordinator")
            .with_operation("evaluate_action")
            .with_action_id(action.id().as_str())
            .span();
        self.evaluate_inner(source, action).instrument(span).await
    }

    async fn evaluate_inner(&self, source: ActionSource, action: &Action) -> EvaluationResult {
        let result = match self.compiled_rules().await {
            Ok(set) => self.engine.evaluate(action, set.rules()),
            Err(e) => {
                warn!(error = %e, "rule store unavailable, using default policy");
                let mut fallback = EvaluationResult::from_default(action.risk_level());
                if fallback.outcome == RuleOutcome::AutoApprove {
                    fallback.outcome = RuleOutcome::RequireApproval;
                    fallback.reason = "rules unavailable, review required".into();
                }
                fallback
            },
        };
        debug!(
            %source,
            risk = %action.risk_level(),
            outcome = %result.outcome,
            rule = result.matched_rule.as_ref().map(|r| r.name.as_str()),
            is_default = result.is_default,
            "evaluated action"
        );
        result
    }

    /// The enabled rules compiled, reusing the cached set while the rule
    /// list is unchanged.
    async fn compiled_rules(&self) -> RuleResult<Arc<RuleSet>> {
        let rules = self.rules.get_enabled_rules_ordered_by_priority_desc().await?;
        if let Some(set) = self.compiled.read().await.as_ref()
            && set.is_current(&rules, &self.config.limits)
        {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(RuleSet::compile(rules, &self.config.limits));
        debug!(count = set.len(), "compiled rule set");
        *self.compiled.write().await = Some(Arc::clone(&set));
        Ok(set)
    }

    // -- Public flows --

    /// Evaluate an action and act on the outcome.
    ///
    /// `auto_approve` and `auto_reject` write an automatic decision to
    /// history. `require_approval` queues the action, expiring after the
    /// configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidAction`] for an action without an id,
    /// [`ApprovalError::Duplicate`] if the action is already pending or
    /// recorded, or a store error.
    pub async fn process_action(
        &self,
        source: ActionSource,
        action: Action,
    ) -> ApprovalResult<ProcessOutcome> {
        action.validate()?;
        let span = RequestContext::new("coordinator")
            .with_operation("process_action")
            .with_action_id(action.id().as_str())
            .span();
        self.process_inner(source, action).instrument(span).await
    }

    async fn process_inner(
        &self,
        source: ActionSource,
        action: Action,
    ) -> ApprovalResult<ProcessOutcome> {
        if self.queue.get(action.id()).await?.is_some()
            || self.audit.get(action.id()).await?.is_some()
        {
            return Err(ApprovalError::Duplicate {
                action_id: action.id().clone(),
            });
        }

        let evaluation = self.evaluate_inner(source, &action).await;
        let verdict = match evaluation.outcome {
            RuleOutcome::AutoApprove => Some(DecisionAction::Approve),
            RuleOutcome::AutoReject => Some(DecisionAction::Reject),
            RuleOutcome::RequireApproval => None,
        };

        if let Some(verdict) = verdict {
            let decision = Decision::auto(verdict, evaluation.reason.clone());
            let entry = ActionHistoryEntry::new(source, action, decision.clone());
            self.audit.append(&entry).await?;
            info!(decision = %decision.action, reason = %decision.reason, "auto decision recorded");
            return Ok(ProcessOutcome {
                decision: Some(decision),
                pending: None,
                evaluation,
            });
        }

        let pending = PendingApproval::new(source, action)
            .queued_at(Timestamp::now())
            .with_ttl(self.config.ttl);
        self.queue.enqueue(&pending).await?;
        info!(expires_at = ?pending.expires_at, "action queued for review");
        Ok(ProcessOutcome {
            decision: None,
            pending: Some(pending),
            evaluation,
        })
    }

    /// Record a reviewer's decision on a queued action.
    ///
    /// Returns `None` if the action is not queued (unknown, already decided,
    /// or expired). Callers should treat that as a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidDecision`] when `modified_params` is
    /// missing for `modify` or present for `approve`/`reject`, or a store
    /// error.
    pub async fn decide_pending(
        &self,
        id: &ActionId,
        action: DecisionAction,
        reason: impl Into<String>,
        modified_params: Option<serde_json::Value>,
    ) -> ApprovalResult<Option<Decision>> {
        let decision = Decision::manual(action, reason, modified_params);
        let span = RequestContext::new("coordinator")
            .with_operation("decide_pending")
            .with_action_id(id.as_str())
            .span();
        self.queue.decide(id, decision).instrument(span).await
    }

    /// Reject every queued action past its expiry. Returns how many were
    /// finalized.
    ///
    /// When a sweep retention is configured, history is pruned afterwards; a
    /// pruning failure is logged and does not fail the sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the expired items cannot be listed.
    pub async fn process_expired_approvals(&self) -> ApprovalResult<usize> {
        let span = RequestContext::new("coordinator")
            .with_operation("process_expired_approvals")
            .span();
        async {
            let count = self
                .queue
                .sweep_expired(Timestamp::now(), self.config.sweep_batch_limit)
                .await?;
            if let Some(keep) = self.config.sweep_retention
                && let Err(e) = self.audit.prune(keep).await
            {
                warn!(error = %e, keep, "history pruning after sweep failed");
            }
            Ok::<_, ApprovalError>(count)
        }
        .instrument(span)
        .await
    }

    /// Seed the canonical rules if the rule store is empty. Returns how many
    /// were written; `0` when any rule already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule store fails.
    pub async fn create_default_rules(&self) -> ApprovalResult<usize> {
        let written = seed_if_empty(self.rules.as_ref(), default_rules(Timestamp::now())).await?;
        Ok(written)
    }

    // -- Queue reads --

    /// Queued actions, highest risk first, then oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn pending_queue(&self) -> ApprovalResult<Vec<PendingApproval>> {
        self.queue.get_ordered_queue().await
    }

    /// The queued action a reviewer should see next.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn peek_next(&self) -> ApprovalResult<Option<PendingApproval>> {
        self.queue.peek_next().await
    }

    /// Record that a reviewer opened a queued action.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn mark_viewed(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        self.queue.mark_viewed(id).await
    }

    /// Number of queued actions.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn pending_count(&self) -> ApprovalResult<usize> {
        self.queue.count().await
    }

    // -- History --

    /// A page of history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn history(&self, offset: usize, limit: usize) -> ApprovalResult<HistoryPage> {
        Ok(self.audit.list(offset, limit).await?)
    }

    /// The history entry for an action.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn history_entry(&self, id: &ActionId) -> ApprovalResult<Option<ActionHistoryEntry>> {
        Ok(self.audit.get(id).await?)
    }

    /// Keep the newest `keep` history entries. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn prune_history(&self, keep: usize) -> ApprovalResult<usize> {
        Ok(self.audit.prune(keep).await?)
    }

    // -- Rule administration --

    /// Validate and store a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Rules`] for invalid drafts or store failures.
    pub async fn create_rule(&self, new: NewRule) -> ApprovalResult<Rule> {
        Ok(self.rules.create_rule(new).await?)
    }

    /// Validate and apply a partial rule update.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Rules`] if the rule is missing, the result is
    /// invalid, or the store fails.
    pub async fn update_rule(&self, id: RuleId, update: RuleUpdate) -> ApprovalResult<Rule> {
        Ok(self.rules.update_rule(id, update).await?)
    }

    /// Delete a rule. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn delete_rule(&self, id: RuleId) -> ApprovalResult<bool> {
        Ok(self.rules.delete_rule(id).await?)
    }

    /// Get a rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_rule(&self, id: RuleId) -> ApprovalResult<Option<Rule>> {
        Ok(self.rules.get_rule(id).await?)
    }

    /// Every rule, enabled or not, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_rules(&self) -> ApprovalResult<Vec<Rule>> {
        Ok(self.rules.get_all_rules().await?)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
