//! Audit-related error types.

use thiserror::Error;
use vigil_core::ActionId;
use vigil_storage::StorageError;

/// Errors that can occur with the action history.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A history entry already exists for this action.
    #[error("history entry already exists for action {action_id}")]
    Duplicate {
        /// The action that was already recorded.
        action_id: ActionId,
    },
}

impl From<StorageError> for AuditError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Serialization(msg) => Self::Serialization(msg),
            other => Self::Storage(other),
        }
    }
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
