//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Entry types
pub use crate::{ActionHistoryEntry, HistoryPage};

// Storage
pub use crate::{AuditStore, KvAuditStore};
