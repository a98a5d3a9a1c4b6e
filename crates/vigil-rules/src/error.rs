//! Rule error types.

use vigil_core::RuleId;
use vigil_storage::StorageError;

/// Errors from rule validation and rule storage.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A rule or condition definition is malformed.
    #[error("invalid rule: {field}: {message}")]
    Validation {
        /// Path of the offending field (e.g. `conditions[1].value`).
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// No rule exists with this id.
    #[error("rule not found: {0}")]
    NotFound(RuleId),

    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RuleError {
    /// Build a [`RuleError::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;
