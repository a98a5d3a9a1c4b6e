//! Runtime error types.

use thiserror::Error;

/// Errors raised while assembling or tearing down a [`Vigil`](crate::Vigil).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] vigil_config::ConfigError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] vigil_storage::StorageError),

    /// Rule store error.
    #[error("rule error: {0}")]
    Rules(#[from] vigil_rules::RuleError),

    /// Audit store error.
    #[error("audit error: {0}")]
    Audit(#[from] vigil_audit::AuditError),

    /// Approval flow error.
    #[error("approval error: {0}")]
    Approval(#[from] vigil_approval::ApprovalError),

    /// Logging setup error.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] vigil_telemetry::TelemetryError),

    /// A config value cannot be represented by the runtime.
    #[error("invalid setting {field}: {message}")]
    InvalidSetting {
        /// Dotted config path.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
