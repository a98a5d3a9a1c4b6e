//! History storage trait and key-value implementation.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use vigil_core::ActionId;
use vigil_storage::{KvStore, ScopedKvStore};

use crate::entry::{ActionHistoryEntry, HistoryPage};
use crate::error::{AuditError, AuditResult};

/// Append-only storage for [`ActionHistoryEntry`] records.
///
/// Entries are never updated. The only way one disappears is count-based
/// retention via [`prune`](Self::prune).
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Duplicate`] if the action already has an entry.
    async fn append(&self, entry: &ActionHistoryEntry) -> AuditResult<()>;

    /// Get the entry for an action.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval or deserialization fails.
    async fn get(&self, action_id: &ActionId) -> AuditResult<Option<ActionHistoryEntry>>;

    /// List entries newest first, skipping `offset` and returning at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval or deserialization fails.
    async fn list(&self, offset: usize, limit: usize) -> AuditResult<HistoryPage>;

    /// Count entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    async fn count(&self) -> AuditResult<usize>;

    /// Keep the newest `keep` entries and delete the rest. Returns how many
    /// were deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    async fn prune(&self, keep: usize) -> AuditResult<usize>;
}

// -- Namespace constants --

const NS_HISTORY: &str = "audit:history";

/// [`AuditStore`] on a key-value backend, keyed by action id.
#[derive(Debug, Clone)]
pub struct KvAuditStore {
    entries: ScopedKvStore,
}

impl KvAuditStore {
    /// Create a store on `kv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be bound.
    pub fn new(kv: Arc<dyn KvStore>) -> AuditResult<Self> {
        Ok(Self {
            entries: ScopedKvStore::new(kv, NS_HISTORY)?,
        })
    }

    async fn load_sorted(&self) -> AuditResult<Vec<ActionHistoryEntry>> {
        let mut entries: Vec<ActionHistoryEntry> = self.entries.values_json().await?;
        entries.sort_by(ActionHistoryEntry::newest_first);
        Ok(entries)
    }
}

#[async_trait]
impl AuditStore for KvAuditStore {
    async fn append(&self, entry: &ActionHistoryEntry) -> AuditResult<()> {
        let written = self
            .entries
            .set_json_if_absent(entry.id.as_str(), entry)
            .await?;
        if !written {
            return Err(AuditError::Duplicate {
                action_id: entry.id.clone(),
            });
        }
        debug!(
            action_id = %entry.id,
            decision = %entry.decision,
            "history entry appended"
        );
        Ok(())
    }

    async fn get(&self, action_id: &ActionId) -> AuditResult<Option<ActionHistoryEntry>> {
        Ok(self.entries.get_json(action_id.as_str()).await?)
    }

    async fn list(&self, offset: usize, limit: usize) -> AuditResult<HistoryPage> {
        let entries = self.load_sorted().await?;
        let total = entries.len();
        let entries = entries.into_iter().skip(offset).take(limit).collect();
        Ok(HistoryPage { entries, total })
    }

    async fn count(&self) -> AuditResult<usize> {
        Ok(self.entries.list_keys().await?.len())
    }

    async fn prune(&self, keep: usize) -> AuditResult<usize> {
        let entries = self.load_sorted().await?;
        let mut deleted = 0usize;
        for entry in entries.iter().skip(keep) {
            if self.entries.delete(entry.id.as_str()).await? {
                deleted = deleted.saturating_add(1);
            }
        }
        if deleted > 0 {
            info!(deleted, keep, "pruned action history");
        }
        Ok(deleted)
    }
}
