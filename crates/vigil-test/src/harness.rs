//! An in-memory decision stack with failure injection wired in.

use std::sync::Arc;

use vigil_approval::{ApprovalQueue, CoordinatorConfig, DecisionCoordinator, KvApprovalStore};
use vigil_audit::{AuditStore, KvAuditStore};
use vigil_rules::{KvRuleStore, RuleStore};
use vigil_storage::{KvStore, MemoryKvStore};

use crate::mocks::{FlakyApprovalStore, FlakyAuditStore, FlakyRuleStore};

/// A coordinator over one in-memory backend, with handles to every store.
pub struct TestStack {
    /// Shared backend.
    pub kv: Arc<dyn KvStore>,
    /// Rule store wrapper.
    pub rules: FlakyRuleStore,
    /// Pending store wrapper.
    pub approvals: FlakyApprovalStore,
    /// History store wrapper.
    pub audit: FlakyAuditStore,
    /// Coordinator over the wrappers.
    pub coordinator: Arc<DecisionCoordinator>,
}

impl TestStack {
    /// Build a stack with default settings and no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Build a stack with `config` and no rules.
    ///
    /// # Panics
    ///
    /// Panics if a namespace cannot be bound, which the in-memory backend
    /// never refuses.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_config(config: CoordinatorConfig) -> Self {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let rules = FlakyRuleStore::new(Arc::new(
            KvRuleStore::new(Arc::clone(&kv), config.limits).expect("rule namespace"),
        ));
        let approvals = FlakyApprovalStore::new(Arc::new(
            KvApprovalStore::new(Arc::clone(&kv)).expect("approval namespace"),
        ));
        let audit = FlakyAuditStore::new(Arc::new(
            KvAuditStore::new(Arc::clone(&kv)).expect("audit namespace"),
        ));

        let audit_dyn: Arc<dyn AuditStore> = Arc::new(audit.clone());
        let queue = ApprovalQueue::new(Arc::new(approvals.clone()), Arc::clone(&audit_dyn));
        let rules_dyn: Arc<dyn RuleStore> = Arc::new(rules.clone());
        let coordinator = Arc::new(DecisionCoordinator::new(rules_dyn, queue, audit_dyn, config));

        Self {
            kv,
            rules,
            approvals,
            audit,
            coordinator,
        }
    }
}

impl Default for TestStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
