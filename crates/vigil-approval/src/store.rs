//! Pending approval storage.
//!
//! [`ApprovalStore`] is the narrow interface the queue reads and writes
//! pending items through. Its [`take`](ApprovalStore::take) must be atomic:
//! when two callers take the same id, exactly one receives the item.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use vigil_core::{ActionId, Timestamp};
use vigil_storage::{KvStore, ScopedKvStore};

use crate::error::ApprovalResult;
use crate::pending::PendingApproval;

/// Storage for pending approvals, keyed by action id.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Store `pending` unless its id is already queued. Returns `true` if
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn insert_if_absent(&self, pending: &PendingApproval) -> ApprovalResult<bool>;

    /// Get a pending item.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn get(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>>;

    /// Delete a pending item. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete(&self, id: &ActionId) -> ApprovalResult<bool>;

    /// Atomically remove a pending item and return it, or `None` if it was
    /// already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn take(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>>;

    /// Every pending item, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn list_all(&self) -> ApprovalResult<Vec<PendingApproval>>;

    /// Pending items with `expires_at <= now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn list_expired(&self, now: Timestamp) -> ApprovalResult<Vec<PendingApproval>> {
        let mut all = self.list_all().await?;
        all.retain(|p| p.is_expired_at(now));
        Ok(all)
    }

    /// Number of pending items.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn count(&self) -> ApprovalResult<usize>;

    /// Increment an item's view count. Returns the updated item, or `None`
    /// if it is no longer pending. Never re-creates a removed item.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn mark_viewed(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>>;
}

const NS_PENDING: &str = "approvals:pending";

/// Retries for a view-count update that keeps losing races.
const VIEW_UPDATE_ATTEMPTS: usize = 8;

/// [`ApprovalStore`] on a key-value backend.
#[derive(Debug, Clone)]
pub struct KvApprovalStore {
    pending: ScopedKvStore,
}

impl KvApprovalStore {
    /// Create a store on `kv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be bound.
    pub fn new(kv: Arc<dyn KvStore>) -> ApprovalResult<Self> {
        Ok(Self {
            pending: ScopedKvStore::new(kv, NS_PENDING)?,
        })
    }
}

#[async_trait]
impl ApprovalStore for KvApprovalStore {
    async fn insert_if_absent(&self, pending: &PendingApproval) -> ApprovalResult<bool> {
        Ok(self
            .pending
            .set_json_if_absent(pending.id.as_str(), pending)
            .await?)
    }

    async fn get(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        Ok(self.pending.get_json(id.as_str()).await?)
    }

    async fn delete(&self, id: &ActionId) -> ApprovalResult<bool> {
        Ok(self.pending.delete(id.as_str()).await?)
    }

    async fn take(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        let taken = self.pending.take_json(id.as_str()).await?;
        debug!(action_id = %id, found = taken.is_some(), "take pending");
        Ok(taken)
    }

    async fn list_all(&self) -> ApprovalResult<Vec<PendingApproval>> {
        Ok(self.pending.values_json().await?)
    }

    async fn count(&self) -> ApprovalResult<usize> {
        Ok(self.pending.list_keys().await?.len())
    }

    async fn mark_viewed(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        Ok(self
            .pending
            .update_json(id.as_str(), VIEW_UPDATE_ATTEMPTS, |p: &mut PendingApproval| {
                p.view_count = p.view_count.saturating_add(1);
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_core::{Action, ActionSource, AgentAction, RiskLevel};
    use vigil_storage::MemoryKvStore;

    fn store() -> KvApprovalStore {
        KvApprovalStore::new(Arc::new(MemoryKvStore::new())).unwrap()
    }

    fn pending(id: &str) -> PendingApproval {
        let action =
            Action::from(AgentAction::new("a", "file_write", RiskLevel::Medium).with_id(id));
        PendingApproval::new(ActionSource::AgentShield, action)
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let s = store();
        let p = pending("p-1");
        assert!(s.insert_if_absent(&p).await.unwrap());
        assert!(!s.insert_if_absent(&p).await.unwrap());
        assert_eq!(s.get(&p.id).await.unwrap(), Some(p.clone()));
        assert_eq!(s.count().await.unwrap(), 1);
        assert!(s.delete(&p.id).await.unwrap());
        assert!(!s.delete(&p.id).await.unwrap());
        assert_eq!(s.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_take_returns_item_once() {
        let s = store();
        let p = pending("p-1");
        s.insert_if_absent(&p).await.unwrap();
        assert_eq!(s.take(&p.id).await.unwrap(), Some(p.clone()));
        assert!(s.take(&p.id).await.unwrap().is_none());
        assert!(s.get(&p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_expired() {
        let s = store();
        let now = Timestamp::now();
        s.insert_if_absent(&pending("due").expires_at(now)).await.unwrap();
        s.insert_if_absent(&pending("later").expires_at(now.saturating_add(Duration::hours(1))))
            .await
            .unwrap();
        s.insert_if_absent(&pending("never")).await.unwrap();

        let expired = s.list_expired(now).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id.as_str(), "due");
        assert_eq!(s.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_mark_viewed_never_resurrects() {
        let s = store();
        let p = pending("p-1");
        s.insert_if_absent(&p).await.unwrap();
        assert_eq!(s.mark_viewed(&p.id).await.unwrap().unwrap().view_count, 1);
        assert_eq!(s.mark_viewed(&p.id).await.unwrap().unwrap().view_count, 2);

        s.take(&p.id).await.unwrap();
        assert!(s.mark_viewed(&p.id).await.unwrap().is_none());
        assert!(s.get(&p.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_views_are_all_counted() {
        let s = Arc::new(store());
        s.insert_if_absent(&pending("p-1")).await.unwrap();
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                tokio::spawn(async move { s.mark_viewed(&ActionId::from("p-1")).await })
            })
            .collect();
        let ok = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(Some(_)))))
            .count();
        let views = s.get(&ActionId::from("p-1")).await.unwrap().unwrap().view_count;
        assert_eq!(usize::try_from(views).unwrap(), ok);
    }
}
