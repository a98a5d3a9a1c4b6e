//! `Vigil` assembled from configuration.

use vigil_config::{Config, StorageBackend};
use vigil_core::{ActionSource, DecisionAction, RiskLevel};
use vigil_runtime::Vigil;
use vigil_test::{test_agent_action, test_shell_action};

fn surrealkv_config(dir: &std::path::Path) -> Config {
    let mut cfg = Config::default();
    cfg.storage.backend = StorageBackend::SurrealKv;
    cfg.storage.path = dir.join("vigil.db").to_string_lossy().into_owned();
    cfg
}

#[tokio::test]
async fn default_rules_seed_once() {
    let vigil = Vigil::in_memory().unwrap();
    let coordinator = vigil.coordinator();
    let first = coordinator.create_default_rules().await.unwrap();
    assert!(first > 0);
    assert_eq!(coordinator.create_default_rules().await.unwrap(), 0);
    assert_eq!(coordinator.list_rules().await.unwrap().len(), first);
}

#[tokio::test]
async fn seeded_rules_drive_decisions() {
    let vigil = Vigil::open(&Config::default()).await.unwrap();
    let coordinator = vigil.coordinator();

    let wipe = coordinator
        .process_action(
            ActionSource::AgentShield,
            test_shell_action("rm -rf /", RiskLevel::Medium),
        )
        .await
        .unwrap();
    assert_eq!(wipe.decision.unwrap().action, DecisionAction::Reject);
    assert_eq!(
        wipe.evaluation.matched_rule.unwrap().name,
        "Block destructive shell commands"
    );

    let low = coordinator
        .process_action(ActionSource::AgentShield, test_agent_action(RiskLevel::Low))
        .await
        .unwrap();
    assert_eq!(low.decision.unwrap().action, DecisionAction::Approve);
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = surrealkv_config(dir.path());

    let pending_id = {
        let vigil = Vigil::open(&cfg).await.unwrap();
        let pending = vigil
            .coordinator()
            .process_action(
                ActionSource::AgentShield,
                test_agent_action(RiskLevel::High),
            )
            .await
            .unwrap()
            .pending
            .unwrap();
        vigil.close().await.unwrap();
        pending.id
    };

    let vigil = Vigil::open(&cfg).await.unwrap();
    let coordinator = vigil.coordinator();
    assert_eq!(coordinator.list_rules().await.unwrap().len(), 6);
    assert_eq!(coordinator.pending_count().await.unwrap(), 1);

    let decision = coordinator
        .decide_pending(&pending_id, DecisionAction::Approve, "after restart", None)
        .await
        .unwrap();
    assert!(decision.is_some());
    assert!(coordinator.history_entry(&pending_id).await.unwrap().is_some());
    vigil.close().await.unwrap();
}

#[tokio::test]
async fn config_file_drives_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vigil.toml");
    std::fs::write(
        &path,
        "[approval]\nttl_secs = 120\n\n[rules]\nseed_defaults = false\n",
    )
    .unwrap();

    let cfg = Config::load_file(&path).unwrap();
    let vigil = Vigil::open(&cfg).await.unwrap();
    assert!(vigil.coordinator().list_rules().await.unwrap().is_empty());
    assert_eq!(
        vigil.coordinator().config().ttl,
        chrono::Duration::seconds(120)
    );
}
