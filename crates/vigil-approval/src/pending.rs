//! Pending approvals.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use vigil_core::{Action, ActionId, ActionSource, RiskLevel, Timestamp};

/// An action waiting for a human decision.
///
/// Exists only while the action is queued. The action snapshot never
/// changes; `view_count` is the only mutable field and is for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The action's id.
    pub id: ActionId,
    /// Intake path.
    pub source: ActionSource,
    /// The action as submitted.
    pub action: Action,
    /// When it was queued.
    pub queued_at: Timestamp,
    /// When the expiry sweep may reject it. `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// How many times a reviewer opened it.
    #[serde(default)]
    pub view_count: u32,
}

impl PendingApproval {
    /// Queue `action` now, without an expiry.
    #[must_use]
    pub fn new(source: ActionSource, action: Action) -> Self {
        Self {
            id: action.id().clone(),
            source,
            action,
            queued_at: Timestamp::now(),
            expires_at: None,
            view_count: 0,
        }
    }

    /// Set the queue time.
    #[must_use]
    pub fn queued_at(mut self, at: Timestamp) -> Self {
        self.queued_at = at;
        self
    }

    /// Expire `ttl` after the queue time.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.queued_at.saturating_add(ttl));
        self
    }

    /// Expire at a fixed time.
    #[must_use]
    pub fn expires_at(mut self, at: Timestamp) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// The action's risk level.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.action.risk_level()
    }

    /// Whether the item is due for expiry at `now` (`expires_at <= now`).
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Queue order: higher risk first, then oldest first, then id.
    #[must_use]
    pub fn queue_order(&self, other: &Self) -> Ordering {
        other
            .risk_level()
            .rank()
            .cmp(&self.risk_level().rank())
            .then_with(|| self.queued_at.cmp(&other.queued_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for PendingApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} (queued {})",
            self.risk_level(),
            self.id,
            self.action.summary(),
            self.queued_at
        )
    }
}
