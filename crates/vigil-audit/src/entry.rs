//! History entries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use vigil_core::{Action, ActionId, ActionSource, Decision, Timestamp};

/// The permanent record of one processed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHistoryEntry {
    /// The processed action's id.
    pub id: ActionId,
    /// Intake path.
    pub source: ActionSource,
    /// The action as submitted.
    pub action: Action,
    /// How it was resolved.
    pub decision: Decision,
    /// When the entry was written.
    pub processed_at: Timestamp,
}

impl ActionHistoryEntry {
    /// Record `decision` for `action`, processed now.
    #[must_use]
    pub fn new(source: ActionSource, action: Action, decision: Decision) -> Self {
        Self {
            id: action.id().clone(),
            source,
            action,
            decision,
            processed_at: Timestamp::now(),
        }
    }

    /// Set the processing time.
    #[must_use]
    pub fn processed_at(mut self, at: Timestamp) -> Self {
        self.processed_at = at;
        self
    }

    /// History order: newest first, ties by id.
    #[must_use]
    pub fn newest_first(&self, other: &Self) -> Ordering {
        other
            .processed_at
            .cmp(&self.processed_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// One page of history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Entries on this page, newest first.
    pub entries: Vec<ActionHistoryEntry>,
    /// Total entries in the history.
    pub total: usize,
}
