//! Decisions recorded for processed actions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Timestamp;

/// Reason recorded when a pending action expires unresolved.
pub const EXPIRED_REASON: &str = "expired";

/// What was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// The action may proceed as proposed.
    Approve,
    /// The action must not proceed.
    Reject,
    /// The action may proceed with reviewer-supplied parameters.
    Modify,
}

impl DecisionAction {
    /// Check if this decision lets the action proceed in some form.
    #[must_use]
    pub fn is_permissive(self) -> bool {
        !matches!(self, Self::Reject)
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Modify => write!(f, "modify"),
        }
    }
}

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    /// By a rule, the default policy, or expiry.
    Auto,
    /// By a human reviewer.
    Manual,
}

impl fmt::Display for DecisionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// The final decision on an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// What was decided.
    pub action: DecisionAction,
    /// How it was decided.
    pub method: DecisionMethod,
    /// Why.
    pub reason: String,
    /// When.
    pub timestamp: Timestamp,
    /// Replacement parameters for [`DecisionAction::Modify`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_params: Option<serde_json::Value>,
}

impl Decision {
    /// An automatic decision made now.
    #[must_use]
    pub fn auto(action: DecisionAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            method: DecisionMethod::Auto,
            reason: reason.into(),
            timestamp: Timestamp::now(),
            modified_params: None,
        }
    }

    /// A manual decision made now.
    #[must_use]
    pub fn manual(
        action: DecisionAction,
        reason: impl Into<String>,
        modified_params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            action,
            method: DecisionMethod::Manual,
            reason: reason.into(),
            timestamp: Timestamp::now(),
            modified_params,
        }
    }

    /// The fail-safe rejection recorded when a pending action expires.
    #[must_use]
    pub fn expired(at: Timestamp) -> Self {
        Self {
            action: DecisionAction::Reject,
            method: DecisionMethod::Auto,
            reason: EXPIRED_REASON.to_string(),
            timestamp: at,
            modified_params: None,
        }
    }

    /// Check if the decision lets the action proceed.
    #[must_use]
    pub fn is_permissive(&self) -> bool {
        self.action.is_permissive()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.action, self.method, self.reason)
    }
}
