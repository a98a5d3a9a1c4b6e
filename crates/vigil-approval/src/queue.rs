//! The pending approval lifecycle.
//!
//! ```text
//! QUEUED ──decide──▶ DECIDED
//!    │
//!    └────sweep────▶ EXPIRED
//! ```
//!
//! Both exits remove the item with [`ApprovalStore::take`] and append one
//! history entry. Because `take` hands the item to exactly one caller, a
//! decision racing the sweep (or another decision) on the same id
//! finalizes it once; the loser sees `None`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use vigil_audit::{ActionHistoryEntry, AuditError, AuditStore};
use vigil_core::{ActionId, Decision, DecisionAction, Timestamp};

use crate::error::{ApprovalError, ApprovalResult};
use crate::pending::PendingApproval;
use crate::store::ApprovalStore;

/// Check that a decision's parameters fit its action.
///
/// # Errors
///
/// Returns [`ApprovalError::InvalidDecision`] for `modify` without
/// parameters, or `approve`/`reject` with them.
pub fn validate_decision(decision: &Decision) -> ApprovalResult<()> {
    match (decision.action, decision.modified_params.is_some()) {
        (DecisionAction::Modify, false) => Err(ApprovalError::InvalidDecision(
            "modify requires modified parameters".into(),
        )),
        (DecisionAction::Approve | DecisionAction::Reject, true) => {
            Err(ApprovalError::InvalidDecision(format!(
                "{} does not take modified parameters",
                decision.action
            )))
        },
        _ => Ok(()),
    }
}

/// Queue of actions awaiting a human decision.
#[derive(Clone)]
pub struct ApprovalQueue {
    store: Arc<dyn ApprovalStore>,
    audit: Arc<dyn AuditStore>,
}

impl ApprovalQueue {
    /// Create a queue over a pending store and a history store.
    #[must_use]
    pub fn new(store: Arc<dyn ApprovalStore>, audit: Arc<dyn AuditStore>) -> Self {
        Self { store, audit }
    }

    /// Queue an item.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Duplicate`] if the id is already queued, or a
    /// storage error.
    pub async fn enqueue(&self, pending: &PendingApproval) -> ApprovalResult<()> {
        if !self.store.insert_if_absent(pending).await? {
            return Err(ApprovalError::Duplicate {
                action_id: pending.id.clone(),
            });
        }
        debug!(
            action_id = %pending.id,
            risk = %pending.risk_level(),
            expires_at = ?pending.expires_at,
            "queued for approval"
        );
        Ok(())
    }

    /// Every queued item, highest risk first, then oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_ordered_queue(&self) -> ApprovalResult<Vec<PendingApproval>> {
        let mut items = self.store.list_all().await?;
        items.sort_by(PendingApproval::queue_order);
        Ok(items)
    }

    /// The item a reviewer should see next.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn peek_next(&self) -> ApprovalResult<Option<PendingApproval>> {
        let items = self.store.list_all().await?;
        Ok(items.into_iter().min_by(PendingApproval::queue_order))
    }

    /// Get a queued item.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        self.store.get(id).await
    }

    /// Number of queued items.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn count(&self) -> ApprovalResult<usize> {
        self.store.count().await
    }

    /// Record that a reviewer opened an item. Returns the updated item, or
    /// `None` if it is no longer queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn mark_viewed(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        self.store.mark_viewed(id).await
    }

    /// Finalize a queued item with `decision`.
    ///
    /// Returns the decision, or `None` if the id is not queued (unknown or
    /// already finalized). An item past its expiry that the sweep has not
    /// reached yet can still be decided.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidDecision`] for inconsistent
    /// parameters, or a store error. If the history append fails the item is
    /// put back in the queue before the error is returned.
    pub async fn decide(
        &self,
        id: &ActionId,
        decision: Decision,
    ) -> ApprovalResult<Option<Decision>> {
        validate_decision(&decision)?;

        let Some(item) = self.store.take(id).await? else {
            debug!(action_id = %id, "decide: not queued");
            return Ok(None);
        };

        self.finalize(item, decision.clone()).await?;
        info!(
            action_id = %id,
            decision = %decision.action,
            method = %decision.method,
            "pending action decided"
        );
        Ok(Some(decision))
    }

    /// Reject every item with `expires_at <= now`, at most `limit` of them
    /// (oldest expiry first). Returns how many were finalized.
    ///
    /// A failure on one item is logged and skipped; it is not counted and
    /// does not stop the sweep. Items finalized concurrently by a decision
    /// are skipped as well.
    ///
    /// # Errors
    ///
    /// Returns an error only if the expired items cannot be listed.
    pub async fn sweep_expired(
        &self,
        now: Timestamp,
        limit: Option<usize>,
    ) -> ApprovalResult<usize> {
        let mut due = self.store.list_expired(now).await?;
        due.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.id.cmp(&b.id)));

        let mut finalized = 0usize;
        for candidate in due {
            if limit.is_some_and(|max| finalized >= max) {
                debug!(limit = ?limit, "sweep batch limit reached");
                break;
            }

            let item = match self.store.take(&candidate.id).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!(action_id = %candidate.id, "sweep: already finalized");
                    continue;
                },
                Err(e) => {
                    warn!(action_id = %candidate.id, error = %e, "sweep: failed to take item");
                    continue;
                },
            };

            let id = item.id.clone();
            match self.finalize(item, Decision::expired(now)).await {
                Ok(()) => finalized = finalized.saturating_add(1),
                Err(e) => {
                    warn!(action_id = %id, error = %e, "sweep: failed to finalize item");
                },
            }
        }

        if finalized > 0 {
            info!(count = finalized, "expired pending approvals rejected");
        }
        Ok(finalized)
    }

    /// Append the history entry for a taken item. On failure the item goes
    /// back in the queue, unless history already records the action.
    async fn finalize(&self, item: PendingApproval, decision: Decision) -> ApprovalResult<()> {
        let entry = ActionHistoryEntry::new(item.source, item.action.clone(), decision);
        match self.audit.append(&entry).await {
            Ok(()) => Ok(()),
            Err(e @ AuditError::Duplicate { .. }) => {
                warn!(action_id = %item.id, "history already holds this action, dropping item");
                Err(e.into())
            },
            Err(e) => {
                self.restore(&item).await;
                Err(e.into())
            },
        }
    }

    async fn restore(&self, item: &PendingApproval) {
        match self.store.insert_if_absent(item).await {
            Ok(true) => warn!(action_id = %item.id, "history append failed, item re-queued"),
            Ok(false) => error!(
                action_id = %item.id,
                "history append failed and the id was re-queued by someone else"
            ),
            Err(e) => error!(
                action_id = %item.id,
                error = %e,
                "history append failed and the item could not be re-queued"
            ),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
