//! Common imports for tests.
//!
//! ```rust,ignore
//! use vigil_test::prelude::*;
//! ```

pub use crate::fixtures::{
    test_agent_action, test_agent_action_with_id, test_expired_pending, test_risk_rule,
    test_shell_action, test_tool_call,
};
pub use crate::harness::{TestStack, init_test_tracing};
pub use crate::mocks::{FlakyApprovalStore, FlakyAuditStore, FlakyRuleStore};
