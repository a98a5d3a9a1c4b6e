use vigil_audit::AuditError;
use vigil_core::{ActionId, CoreError};
use vigil_rules::RuleError;
use vigil_storage::StorageError;

/// Errors from the pending queue and the coordinator.
///
/// "Not found" and "already resolved" are not errors: they surface as
/// `None` or `0`.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The action is already pending or already recorded in history.
    #[error("action {action_id} is already pending or processed")]
    Duplicate {
        /// The duplicated action.
        action_id: ActionId,
    },

    /// A decision is internally inconsistent (e.g. `modify` without
    /// parameters).
    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    /// The submitted action is malformed.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] CoreError),

    /// Rule storage or validation failed.
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// The history store failed.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The pending store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
