//! Telemetry error types.

use thiserror::Error;

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or a directive is not a valid filter.
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter {
        /// The rejected filter text.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed, or installing one failed.
    #[error("failed to install subscriber: {0}")]
    InitError(String),

    /// The log directory could not be prepared.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
