//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers and time
pub use crate::{ActionId, RuleId, Timestamp};

// Classification
pub use crate::{ActionSource, RiskLevel};

// Actions
pub use crate::{Action, AgentAction, ToolCall};

// Decisions
pub use crate::{Decision, DecisionAction, DecisionMethod};
