//! Vigil Audit - Append-only history of processed actions.
//!
//! Every action the engine finalizes, whether by a rule, the default policy,
//! a reviewer, or expiry, produces exactly one [`ActionHistoryEntry`]. Entries
//! are keyed by action id and written with insert-if-absent semantics, so a
//! second append for the same action is refused with
//! [`AuditError::Duplicate`] rather than silently recorded twice.
//!
//! # Example
//!
//! ```
//! use vigil_audit::ActionHistoryEntry;
//! use vigil_core::{Action, ActionSource, AgentAction, Decision, DecisionAction, RiskLevel};
//!
//! let action = Action::from(AgentAction::new("claude-code", "file_read", RiskLevel::Low));
//! let entry = ActionHistoryEntry::new(
//!     ActionSource::AgentShield,
//!     action,
//!     Decision::auto(DecisionAction::Approve, "low risk"),
//! );
//! assert_eq!(entry.id.as_str(), entry.action.id().as_str());
//! assert_eq!(entry.decision.action, DecisionAction::Approve);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod entry;
pub mod error;
pub mod storage;

pub use entry::{ActionHistoryEntry, HistoryPage};
pub use error::{AuditError, AuditResult};
pub use storage::{AuditStore, KvAuditStore};
