//! `process_action` and `decide_pending` end to end.

use std::sync::Arc;

use vigil_approval::ApprovalError;
use vigil_core::{ActionId, ActionSource, DecisionAction, DecisionMethod, RiskLevel};
use vigil_test::{TestStack, test_agent_action, test_agent_action_with_id, test_tool_call};

#[tokio::test]
async fn deciding_an_unknown_id_is_a_no_op() {
    let stack = TestStack::new();
    let result = stack
        .coordinator
        .decide_pending(
            &ActionId::from("nonexistent"),
            DecisionAction::Approve,
            "x",
            None,
        )
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 0);
}

#[tokio::test]
async fn low_risk_is_auto_approved() {
    let stack = TestStack::new();
    let action = test_agent_action(RiskLevel::Low);
    let id = action.id().clone();

    let outcome = stack
        .coordinator
        .process_action(ActionSource::AgentShield, action)
        .await
        .unwrap();
    let decision = outcome.decision.unwrap();
    assert_eq!(decision.method, DecisionMethod::Auto);
    assert_eq!(decision.action, DecisionAction::Approve);
    assert!(outcome.pending.is_none());

    let entry = stack.coordinator.history_entry(&id).await.unwrap().unwrap();
    assert_eq!(entry.decision, decision);
    assert_eq!(stack.coordinator.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn medium_risk_waits_for_a_reviewer() {
    let stack = TestStack::new();
    let outcome = stack
        .coordinator
        .process_action(ActionSource::McpGateway, test_tool_call(RiskLevel::Medium))
        .await
        .unwrap();
    assert!(outcome.decision.is_none());
    let pending = outcome.pending.unwrap();
    assert!(pending.expires_at.is_some());
    assert_eq!(stack.coordinator.pending_queue().await.unwrap(), vec![pending.clone()]);

    let decision = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Approve, "ok", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decision.method, DecisionMethod::Manual);
    assert_eq!(decision.action, DecisionAction::Approve);
    assert!(stack.coordinator.pending_queue().await.unwrap().is_empty());

    let history = stack.coordinator.history(0, 10).await.unwrap();
    assert_eq!(history.total, 1);
    assert_eq!(history.entries[0].source, ActionSource::McpGateway);
}

#[tokio::test]
async fn second_decision_is_ignored() {
    let stack = TestStack::new();
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

    let first = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Reject, "no", None)
        .await
        .unwrap();
    let second = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Approve, "yes", None)
        .await
        .unwrap();
    assert_eq!(first.unwrap().action, DecisionAction::Reject);
    assert!(second.is_none());

    let entry = stack
        .coordinator
        .history_entry(&pending.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.decision.action, DecisionAction::Reject);
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reviewers_record_one_decision() {
    let stack = TestStack::new();
    let pending = stack
        .coordinator
        .process_action(
            ActionSource::AgentShield,
            test_agent_action(RiskLevel::Medium),
        )
        .await
        .unwrap()
        .pending
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = Arc::clone(&stack.coordinator);
            let id = pending.id.clone();
            tokio::spawn(async move {
                coordinator
                    .decide_pending(&id, DecisionAction::Approve, format!("reviewer {i}"), None)
                    .await
                    .unwrap()
            })
        })
        .collect();
    let winners = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|r| r.as_ref().unwrap().is_some())
        .count();
    assert_eq!(winners, 1);
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 1);
}

#[tokio::test]
async fn modify_carries_replacement_parameters() {
    let stack = TestStack::new();
    let pending = stack
        .coordinator
        .process_action(ActionSource::McpGateway, test_tool_call(RiskLevel::High))
        .await
        .unwrap()
        .pending
        .unwrap();

    let missing = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Modify, "tweak", None)
        .await;
    assert!(matches!(missing, Err(ApprovalError::InvalidDecision(_))));
    assert_eq!(stack.coordinator.pending_count().await.unwrap(), 1);

    let params = serde_json::json!({"title": "edited"});
    let decision = stack
        .coordinator
        .decide_pending(
            &pending.id,
            DecisionAction::Modify,
            "tweak",
            Some(params.clone()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decision.modified_params, Some(params));
}

#[tokio::test]
async fn resubmitting_an_action_is_refused() {
    let stack = TestStack::new();
    for risk in [RiskLevel::Low, RiskLevel::Medium] {
        let id = format!("dup-{risk}");
        stack
            .coordinator
            .process_action(
                ActionSource::AgentShield,
                test_agent_action_with_id(&id, risk),
            )
            .await
            .unwrap();
        let again = stack
            .coordinator
            .process_action(
                ActionSource::AgentShield,
                test_agent_action_with_id(&id, risk),
            )
            .await;
        assert!(matches!(again, Err(ApprovalError::Duplicate { .. })));
    }
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 1);
    assert_eq!(stack.coordinator.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn failed_history_write_keeps_the_item_queued() {
    let stack = TestStack::new();
    let pending = stack
        .coordinator
        .process_action(
            ActionSource::AgentShield,
            test_agent_action(RiskLevel::Medium),
        )
        .await
        .unwrap()
        .pending
        .unwrap();

    stack.audit.fail_for(pending.id.as_str());
    let failed = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Approve, "ok", None)
        .await;
    assert!(matches!(failed, Err(ApprovalError::Audit(_))));
    assert!(stack.coordinator.queue().get(&pending.id).await.unwrap().is_some());

    stack.audit.heal();
    let decision = stack
        .coordinator
        .decide_pending(&pending.id, DecisionAction::Approve, "ok", None)
        .await
        .unwrap();
    assert!(decision.is_some());
    assert_eq!(stack.coordinator.history(0, 10).await.unwrap().total, 1);
}

#[tokio::test]
async fn reviewers_see_riskiest_first() {
    let stack = TestStack::new();
    for risk in [RiskLevel::Medium, RiskLevel::High, RiskLevel::Medium] {
        stack
            .coordinator
            .process_action(ActionSource::AgentShield, test_agent_action(risk))
            .await
            .unwrap();
    }
    let next = stack.coordinator.peek_next().await.unwrap().unwrap();
    assert_eq!(next.risk_level(), RiskLevel::High);

    let viewed = stack.coordinator.mark_viewed(&next.id).await.unwrap().unwrap();
    assert_eq!(viewed.view_count, 1);

    let risks: Vec<_> = stack
        .coordinator
        .pending_queue()
        .await
        .unwrap()
        .iter()
        .map(vigil_approval::PendingApproval::risk_level)
        .collect();
    assert_eq!(risks, [RiskLevel::High, RiskLevel::Medium, RiskLevel::Medium]);
}
