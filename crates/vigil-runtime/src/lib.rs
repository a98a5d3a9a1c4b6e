//! Vigil Runtime - assembles the decision engine from configuration.
//!
//! [`Vigil`] owns the storage backend and the [`DecisionCoordinator`] built
//! on it. Open it once at startup, share [`Vigil::coordinator`] with request
//! handlers, and call [`Vigil::close`] on shutdown.
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_config::Config;
//! use vigil_core::{ActionSource, AgentAction, RiskLevel};
//! use vigil_runtime::Vigil;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolved = Config::load(None)?;
//! vigil_runtime::init_logging(&resolved.config)?;
//! let vigil = Vigil::open(&resolved.config).await?;
//!
//! let action = AgentAction::new("claude-code", "file_read", RiskLevel::Low);
//! let outcome = vigil
//!     .coordinator()
//!     .process_action(ActionSource::AgentShield, action.into())
//!     .await?;
//! if let Some(decision) = &outcome.decision {
//!     println!("{}", decision.action);
//! }
//!
//! vigil.close().await?;
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

pub mod config_bridge;
pub mod error;

pub use error::{RuntimeError, RuntimeResult};

use std::sync::Arc;

use tracing::info;

use vigil_approval::{ApprovalQueue, CoordinatorConfig, DecisionCoordinator, KvApprovalStore};
use vigil_audit::{AuditStore, KvAuditStore};
use vigil_config::{Config, StorageBackend};
use vigil_rules::{KvRuleStore, RuleStore};
use vigil_storage::{KvStore, MemoryKvStore, SurrealKvStore};

/// Install the global `tracing` subscriber described by the `[logging]`
/// section.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a subscriber is
/// already installed.
pub fn init_logging(cfg: &Config) -> RuntimeResult<()> {
    vigil_telemetry::setup_logging(&config_bridge::to_log_config(cfg))?;
    Ok(())
}

/// An assembled decision engine over one storage backend.
pub struct Vigil {
    kv: Arc<dyn KvStore>,
    coordinator: Arc<DecisionCoordinator>,
}

impl Vigil {
    /// Open the configured backend, wire the stores, and seed the default
    /// rules when `rules.seed_defaults` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened, a setting cannot be
    /// translated, or seeding fails.
    pub async fn open(cfg: &Config) -> RuntimeResult<Self> {
        let kv: Arc<dyn KvStore> = match cfg.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryKvStore::new()),
            StorageBackend::SurrealKv => Arc::new(SurrealKvStore::open(&cfg.storage.path)?),
        };
        info!(backend = ?cfg.storage.backend, "opening vigil");

        let vigil = Self::assemble(kv, config_bridge::to_coordinator_config(cfg)?)?;
        if cfg.rules.seed_defaults {
            vigil.coordinator.create_default_rules().await?;
        }
        Ok(vigil)
    }

    /// Build the same graph on an in-memory backend, with default settings
    /// and no rules.
    ///
    /// # Errors
    ///
    /// Returns an error if a store namespace cannot be bound.
    pub fn in_memory() -> RuntimeResult<Self> {
        Self::assemble(Arc::new(MemoryKvStore::new()), CoordinatorConfig::default())
    }

    /// Wire the stores, queue and coordinator on `kv`.
    ///
    /// # Errors
    ///
    /// Returns an error if a store namespace cannot be bound.
    pub fn assemble(kv: Arc<dyn KvStore>, config: CoordinatorConfig) -> RuntimeResult<Self> {
        let rules: Arc<dyn RuleStore> = Arc::new(KvRuleStore::new(Arc::clone(&kv), config.limits)?);
        let audit: Arc<dyn AuditStore> = Arc::new(KvAuditStore::new(Arc::clone(&kv))?);
        let approvals = Arc::new(KvApprovalStore::new(Arc::clone(&kv))?);
        let queue = ApprovalQueue::new(approvals, Arc::clone(&audit));

        let coordinator = Arc::new(DecisionCoordinator::new(rules, queue, audit, config));
        Ok(Self { kv, coordinator })
    }

    /// The coordinator, shareable across tasks.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<DecisionCoordinator> {
        &self.coordinator
    }

    /// The storage backend.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// Flush and close the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to close.
    pub async fn close(self) -> RuntimeResult<()> {
        self.kv.close().await?;
        info!("vigil closed");
        Ok(())
    }
}

impl std::fmt::Debug for Vigil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vigil")
            .field("config", self.coordinator.config())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ActionSource, AgentAction, DecisionAction, RiskLevel};

    #[tokio::test]
    async fn test_in_memory_has_no_rules() {
        let vigil = Vigil::in_memory().unwrap();
        assert!(vigil.coordinator().list_rules().await.unwrap().is_empty());
        vigil.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_memory_seeds_defaults() {
        let vigil = Vigil::open(&Config::default()).await.unwrap();
        assert_eq!(vigil.coordinator().list_rules().await.unwrap().len(), 6);

        let outcome = vigil
            .coordinator()
            .process_action(
                ActionSource::AgentShield,
                AgentAction::new("a", "file_read", RiskLevel::Low).into(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.decision.unwrap().action, DecisionAction::Approve);
    }

    #[tokio::test]
    async fn test_open_without_seeding() {
        let mut cfg = Config::default();
        cfg.rules.seed_defaults = false;
        let vigil = Vigil::open(&cfg).await.unwrap();
        assert!(vigil.coordinator().list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_applies_config() {
        let mut cfg = Config::default();
        cfg.approval.ttl_secs = 60;
        cfg.approval.sweep_batch_limit = 5;
        let vigil = Vigil::open(&cfg).await.unwrap();
        let coord = vigil.coordinator().config();
        assert_eq!(coord.ttl, chrono::Duration::seconds(60));
        assert_eq!(coord.sweep_batch_limit, Some(5));
    }

    #[tokio::test]
    async fn test_open_surrealkv() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.storage.backend = StorageBackend::SurrealKv;
        cfg.storage.path = dir.path().join("vigil.db").to_string_lossy().into_owned();

        let vigil = Vigil::open(&cfg).await.unwrap();
        assert_eq!(vigil.coordinator().list_rules().await.unwrap().len(), 6);
        vigil.close().await.unwrap();
    }
}
