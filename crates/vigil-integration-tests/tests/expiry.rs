//! Expiry sweeps.

use chrono::Duration;

use vigil_approval::{ApprovalStore, CoordinatorConfig};
use vigil_core::{ActionSource, DecisionAction, DecisionMethod, RiskLevel};
use vigil_test::{TestStack, test_agent_action, test_expired_pending};

#[tokio::test]
async fn expired_item_is_rejected_once() {
    let stack = TestStack::new();
    let expired = test_expired_pending("stale");
    assert!(stack.approvals.insert_if_absent(&expired).await.unwrap());

    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 1);

    let history = stack.coordinator.history(0, 10).await.unwrap();
    assert_eq!(history.total, 1);
    let decision = &history.entries[0].decision;
    assert_eq!(decision.method, DecisionMethod::Auto);
    assert_eq!(decision.action, DecisionAction::Reject);
    assert!(stack.coordinator.pending_queue().await.unwrap().is_empty());

    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 0);
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 1);
}

#[tokio::test]
async fn live_items_survive_the_sweep() {
    let stack = TestStack::new();
    stack
        .coordinator
        .process_action(
            ActionSource::AgentShield,
            test_agent_action(RiskLevel::Medium),
        )
        .await
        .unwrap();
    stack
        .approvals
        .insert_if_absent(&test_expired_pending("stale"))
        .await
        .unwrap();

    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 1);
    assert_eq!(stack.coordinator.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn zero_ttl_expires_on_the_next_sweep() {
    let stack = TestStack::with_config(CoordinatorConfig::default().with_ttl(Duration::zero()));
    let pending = stack
        .coordinator
        .process_action(
            ActionSource::AgentShield,
            test_agent_action(RiskLevel::High),
        )
        .await
        .unwrap()
        .pending
        .unwrap();

    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 1);
    assert!(
        stack
            .coordinator
            .decide_pending(&pending.id, DecisionAction::Approve, "late", None)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn sweep_skips_failures_and_finishes_the_rest() {
    let stack = TestStack::new();
    for id in ["a", "b", "c"] {
        stack
            .approvals
            .insert_if_absent(&test_expired_pending(id))
            .await
            .unwrap();
    }
    stack.approvals.fail_for("a");
    stack.audit.fail_for("b");

    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 1);

    let left: Vec<_> = stack
        .coordinator
        .pending_queue()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id.0)
        .collect();
    assert_eq!(left.len(), 2);
    assert!(left.contains(&"a".to_string()));
    assert!(left.contains(&"b".to_string()));

    stack.approvals.heal();
    stack.audit.heal();
    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 2);
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 3);
}

#[tokio::test]
async fn batch_limit_caps_each_sweep() {
    let stack = TestStack::with_config(CoordinatorConfig::default().with_sweep_batch_limit(2));
    for id in ["a", "b", "c"] {
        stack
            .approvals
            .insert_if_absent(&test_expired_pending(id))
            .await
            .unwrap();
    }
    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 2);
    assert_eq!(stack.coordinator.process_expired_approvals().await.unwrap(), 1);
    assert_eq!(stack.coordinator.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn sweep_prunes_history_when_configured() {
    let stack = TestStack::with_config(CoordinatorConfig::default().with_sweep_retention(2));
    for _ in 0..4 {
        stack
            .coordinator
            .process_action(ActionSource::AgentShield, test_agent_action(RiskLevel::Low))
            .await
            .unwrap();
    }
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 4);

    stack.coordinator.process_expired_approvals().await.unwrap();
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 2);
}
