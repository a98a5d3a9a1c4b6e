//! Core error types.

use thiserror::Error;

/// Errors raised for malformed core values.
///
/// These represent programmer errors (an action without an id, a decision
/// that is internally inconsistent), not routine conditions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A value could not be parsed.
    #[error("invalid {kind}: {value}")]
    InvalidValue {
        /// What was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
