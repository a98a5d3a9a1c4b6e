//! Vigil Approval - The pending approval lifecycle and decision flows.
//!
//! This crate provides:
//! - [`PendingApproval`]: an action waiting for a human decision
//! - [`ApprovalStore`] / [`KvApprovalStore`]: pending storage with an atomic
//!   `take`
//! - [`ApprovalQueue`]: enqueue, prioritized reads, manual decisions and the
//!   expiry sweep, each finalizing an item at most once
//! - [`DecisionCoordinator`]: rule evaluation, automatic decisions, queueing,
//!   rule seeding and history reads
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! use vigil_approval::{
//!     ApprovalQueue, CoordinatorConfig, DecisionCoordinator, KvApprovalStore,
//! };
//! use vigil_audit::KvAuditStore;
//! use vigil_core::{Action, ActionSource, AgentAction, DecisionAction, RiskLevel};
//! use vigil_rules::{KvRuleStore, RuleLimits};
//! use vigil_storage::{KvStore, MemoryKvStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), vigil_approval::ApprovalError> {
//! let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
//! let audit = Arc::new(KvAuditStore::new(Arc::clone(&kv))?);
//! let queue = ApprovalQueue::new(Arc::new(KvApprovalStore::new(Arc::clone(&kv))?), audit.clone());
//! let rules = Arc::new(KvRuleStore::new(kv, RuleLimits::default())?);
//! let coordinator = DecisionCoordinator::new(rules, queue, audit, CoordinatorConfig::default());
//!
//! let action = Action::from(AgentAction::new("claude-code", "file_write", RiskLevel::Medium));
//! let outcome = coordinator.process_action(ActionSource::AgentShield, action).await?;
//! let pending = outcome.pending.expect("medium risk is queued");
//!
//! let decision = coordinator
//!     .decide_pending(&pending.id, DecisionAction::Approve, "looks fine", None)
//!     .await?;
//! assert!(decision.is_some());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod coordinator;
/// Error types and results for the approval crate.
pub mod error;
pub mod pending;
pub mod queue;
pub mod store;

pub use coordinator::{CoordinatorConfig, DecisionCoordinator, ProcessOutcome};
pub use error::{ApprovalError, ApprovalResult};
pub use pending::PendingApproval;
pub use queue::{ApprovalQueue, validate_decision};
pub use store::{ApprovalStore, KvApprovalStore};
