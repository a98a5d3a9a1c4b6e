//! Store wrappers that fail on demand.
//!
//! Each wrapper delegates to a real store and fails the chosen operation for
//! the ids registered with `fail_for`, until `heal` is called.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use vigil_approval::{ApprovalResult, ApprovalStore, PendingApproval};
use vigil_audit::{ActionHistoryEntry, AuditResult, AuditStore, HistoryPage};
use vigil_core::{ActionId, RuleId};
use vigil_rules::{NewRule, Rule, RuleError, RuleResult, RuleStore, RuleUpdate};
use vigil_storage::StorageError;

fn injected() -> StorageError {
    StorageError::Connection("injected failure".to_string())
}

/// A set of ids to fail, shared between clones.
#[derive(Debug, Clone, Default)]
struct FailSet(Arc<Mutex<HashSet<String>>>);

impl FailSet {
    fn insert(&self, id: &str) {
        if let Ok(mut guard) = self.0.lock() {
            guard.insert(id.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.0.lock() {
            guard.clear();
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.0.lock().map(|g| g.contains(id)).unwrap_or(false)
    }
}

/// History store whose `append` fails for chosen action ids.
#[derive(Clone)]
pub struct FlakyAuditStore {
    inner: Arc<dyn AuditStore>,
    fail: FailSet,
}

impl FlakyAuditStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn AuditStore>) -> Self {
        Self {
            inner,
            fail: FailSet::default(),
        }
    }

    /// Fail appends for `id`.
    pub fn fail_for(&self, id: &str) {
        self.fail.insert(id);
    }

    /// Stop failing.
    pub fn heal(&self) {
        self.fail.clear();
    }
}

#[async_trait]
impl AuditStore for FlakyAuditStore {
    async fn append(&self, entry: &ActionHistoryEntry) -> AuditResult<()> {
        if self.fail.contains(entry.id.as_str()) {
            return Err(injected().into());
        }
        self.inner.append(entry).await
    }

    async fn get(&self, action_id: &ActionId) -> AuditResult<Option<ActionHistoryEntry>> {
        self.inner.get(action_id).await
    }

    async fn list(&self, offset: usize, limit: usize) -> AuditResult<HistoryPage> {
        self.inner.list(offset, limit).await
    }

    async fn count(&self) -> AuditResult<usize> {
        self.inner.count().await
    }

    async fn prune(&self, keep: usize) -> AuditResult<usize> {
        self.inner.prune(keep).await
    }
}

/// Pending store whose `take` fails for chosen action ids.
#[derive(Clone)]
pub struct FlakyApprovalStore {
    inner: Arc<dyn ApprovalStore>,
    fail: FailSet,
}

impl FlakyApprovalStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn ApprovalStore>) -> Self {
        Self {
            inner,
            fail: FailSet::default(),
        }
    }

    /// Fail takes for `id`.
    pub fn fail_for(&self, id: &str) {
        self.fail.insert(id);
    }

    /// Stop failing.
    pub fn heal(&self) {
        self.fail.clear();
    }
}

#[async_trait]
impl ApprovalStore for FlakyApprovalStore {
    async fn insert_if_absent(&self, pending: &PendingApproval) -> ApprovalResult<bool> {
        self.inner.insert_if_absent(pending).await
    }

    async fn get(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: &ActionId) -> ApprovalResult<bool> {
        self.inner.delete(id).await
    }

    async fn take(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        if self.fail.contains(id.as_str()) {
            return Err(injected().into());
        }
        self.inner.take(id).await
    }

    async fn list_all(&self) -> ApprovalResult<Vec<PendingApproval>> {
        self.inner.list_all().await
    }

    async fn count(&self) -> ApprovalResult<usize> {
        self.inner.count().await
    }

    async fn mark_viewed(&self, id: &ActionId) -> ApprovalResult<Option<PendingApproval>> {
        self.inner.mark_viewed(id).await
    }
}

/// Rule store whose reads of enabled rules can be switched off.
#[derive(Clone)]
pub struct FlakyRuleStore {
    inner: Arc<dyn RuleStore>,
    down: Arc<Mutex<bool>>,
}

impl FlakyRuleStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn RuleStore>) -> Self {
        Self {
            inner,
            down: Arc::new(Mutex::new(false)),
        }
    }

    /// Make `get_enabled_rules_ordered_by_priority_desc` fail.
    pub fn go_down(&self) {
        if let Ok(mut down) = self.down.lock() {
            *down = true;
        }
    }

    /// Stop failing.
    pub fn heal(&self) {
        if let Ok(mut down) = self.down.lock() {
            *down = false;
        }
    }

    fn is_down(&self) -> bool {
        self.down.lock().map(|d| *d).unwrap_or(false)
    }
}

#[async_trait]
impl RuleStore for FlakyRuleStore {
    async fn get_enabled_rules_ordered_by_priority_desc(&self) -> RuleResult<Vec<Rule>> {
        if self.is_down() {
            return Err(RuleError::Storage(injected()));
        }
        self.inner.get_enabled_rules_ordered_by_priority_desc().await
    }

    async fn create_rule(&self, new: NewRule) -> RuleResult<Rule> {
        self.inner.create_rule(new).await
    }

    async fn update_rule(&self, id: RuleId, update: RuleUpdate) -> RuleResult<Rule> {
        self.inner.update_rule(id, update).await
    }

    async fn delete_rule(&self, id: RuleId) -> RuleResult<bool> {
        self.inner.delete_rule(id).await
    }

    async fn get_rule(&self, id: RuleId) -> RuleResult<Option<Rule>> {
        self.inner.get_rule(id).await
    }

    async fn get_all_rules(&self) -> RuleResult<Vec<Rule>> {
        self.inner.get_all_rules().await
    }

    async fn count(&self) -> RuleResult<usize> {
        self.inner.count().await
    }

    async fn insert_if_absent(&self, rule: Rule) -> RuleResult<bool> {
        self.inner.insert_if_absent(rule).await
    }
}
