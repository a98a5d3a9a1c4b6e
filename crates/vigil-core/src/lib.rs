//! Vigil Core - Shared data model for the approval decision engine.
//!
//! This crate provides:
//! - Identifier and timestamp types ([`ActionId`], [`RuleId`], [`Timestamp`])
//! - Risk classification ([`RiskLevel`]) as produced by an external classifier
//! - The [`Action`] union of agent actions and tool calls
//! - [`Decision`] records produced by automatic or manual resolution
//!
//! Everything here is plain data. Evaluation lives in `vigil-rules`, the
//! pending lifecycle in `vigil-approval`, and persistence in `vigil-storage`.
//!
//! # Example
//!
//! ```
//! use vigil_core::{Action, ActionSource, AgentAction, RiskLevel};
//!
//! let action = Action::Agent(
//!     AgentAction::new("claude-code", "file_write", RiskLevel::Medium)
//!         .with_target("/etc/hosts")
//!         .with_description("Edit hosts file"),
//! );
//!
//! assert_eq!(action.source(), ActionSource::AgentShield);
//! assert_eq!(action.risk_level().rank(), 2);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod action;
pub mod decision;
pub mod error;
pub mod types;

pub use action::{Action, AgentAction, ToolCall};
pub use decision::{Decision, DecisionAction, DecisionMethod};
pub use error::{CoreError, CoreResult};
pub use types::{ActionId, ActionSource, RiskLevel, RuleId, Timestamp};
