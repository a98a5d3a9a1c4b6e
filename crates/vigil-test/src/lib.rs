//! Shared test utilities for Vigil.
//!
//! Fixtures build actions and rules, the mocks wrap real stores so a test can
//! fail chosen operations, and [`TestStack`] wires both into an in-memory
//! coordinator.
//!
//! ```rust,ignore
//! use vigil_core::{ActionSource, RiskLevel};
//! use vigil_test::{TestStack, test_agent_action};
//!
//! #[tokio::test]
//! async fn test_low_risk_is_auto_approved() {
//!     let stack = TestStack::new();
//!     let outcome = stack
//!         .coordinator
//!         .process_action(ActionSource::AgentShield, test_agent_action(RiskLevel::Low))
//!         .await
//!         .unwrap();
//!     assert!(!outcome.is_pending());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
