//! Vigil Telemetry - Logging and request correlation.
//!
//! This crate provides:
//! - [`setup_logging`] for installing a `tracing` subscriber in one of four
//!   formats, to a stream or to rolling files
//! - [`RequestContext`] for tagging every log line of one engine operation
//!   with the same request, correlation, and action ids
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), vigil_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("vigil_rules=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("coordinator")
//!     .with_operation("process_action")
//!     .with_action_id("a-42");
//! let _entered = ctx.span().entered();
//! tracing::info!("evaluating");
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

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
