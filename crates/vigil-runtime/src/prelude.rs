//! Common imports for embedding Vigil.
//!
//! ```rust,ignore
//! use vigil_runtime::prelude::*;
//! ```

pub use crate::{RuntimeError, RuntimeResult, Vigil, init_logging};

pub use vigil_approval::{DecisionCoordinator, PendingApproval, ProcessOutcome};
pub use vigil_config::Config;
pub use vigil_core::{Action, ActionId, ActionSource, DecisionAction, RiskLevel};
