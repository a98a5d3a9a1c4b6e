//! Configuration types.
//!
//! This crate depends on no other vigil crate. Values mirror the domain
//! types (rule limits, log formats) as plain numbers and strings and are
//! converted where the runtime wires things together. Every struct has a
//! [`Default`] matching `defaults.toml`, so a bare `[section]` header
//! produces a working configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the decision engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pending approval lifetime and sweep batching.
    pub approval: ApprovalSection,
    /// History retention.
    pub audit: AuditSection,
    /// Rule seeding and evaluation limits.
    pub rules: RulesSection,
    /// Key-value backend selection.
    pub storage: StorageSection,
    /// Log level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Pending approval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// Seconds between queueing and expiry.
    pub ttl_secs: u64,
    /// Maximum items finalized per sweep. `0` means unlimited.
    pub sweep_batch_limit: usize,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_batch_limit: 0,
        }
    }
}

impl ApprovalSection {
    /// The sweep batch limit as an option (`None` when unlimited).
    #[must_use]
    pub fn batch_limit(&self) -> Option<usize> {
        (self.sweep_batch_limit > 0).then_some(self.sweep_batch_limit)
    }
}

// ---------------------------------------------------------------------------
// AuditSection
// ---------------------------------------------------------------------------

/// History retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// Entries kept when history is pruned. `0` disables pruning.
    pub retention_keep: usize,
    /// Prune after every expiry sweep.
    pub prune_on_sweep: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            retention_keep: 10_000,
            prune_on_sweep: true,
        }
    }
}

impl AuditSection {
    /// The number of entries to keep after a sweep, if sweeps should prune.
    #[must_use]
    pub fn sweep_retention(&self) -> Option<usize> {
        (self.prune_on_sweep && self.retention_keep > 0).then_some(self.retention_keep)
    }
}

// ---------------------------------------------------------------------------
// RulesSection
// ---------------------------------------------------------------------------

/// Rule seeding and evaluation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Seed the canonical rules into an empty store at startup.
    pub seed_defaults: bool,
    /// Maximum conditions per rule.
    pub max_conditions: usize,
    /// Maximum `matches_regex` pattern length in bytes.
    pub max_pattern_len: usize,
    /// Compiled regex size budget in bytes.
    pub regex_size_limit: usize,
    /// Inspected text is truncated to this many bytes before matching.
    pub max_haystack_len: usize,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            seed_defaults: true,
            max_conditions: 32,
            max_pattern_len: 512,
            regex_size_limit: 262_144,
            max_haystack_len: 65_536,
        }
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Which key-value backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit.
    #[default]
    Memory,
    /// Persistent `SurrealKV` database at [`StorageSection::path`].
    SurrealKv,
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend kind.
    pub backend: StorageBackend,
    /// Database directory. Required for [`StorageBackend::SurrealKv`].
    pub path: String,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Per-crate directives (e.g. `["vigil_rules=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
