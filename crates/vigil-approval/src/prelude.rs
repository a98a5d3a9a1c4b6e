//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_approval::prelude::*;` to import all essential types.

// Errors
pub use crate::{ApprovalError, ApprovalResult};

// Pending lifecycle
pub use crate::{ApprovalQueue, ApprovalStore, KvApprovalStore, PendingApproval};

// Coordination
pub use crate::{CoordinatorConfig, DecisionCoordinator, ProcessOutcome};
