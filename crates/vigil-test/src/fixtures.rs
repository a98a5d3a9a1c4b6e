//! Fixtures for actions and rules.

use chrono::Duration;

use vigil_approval::PendingApproval;
use vigil_core::{Action, ActionSource, AgentAction, RiskLevel, Timestamp, ToolCall};
use vigil_rules::{Condition, ConditionField, NewRule, RuleOutcome};

/// An agent action at `risk`.
#[must_use]
pub fn test_agent_action(risk: RiskLevel) -> Action {
    Action::from(
        AgentAction::new("test-agent", "file_write", risk)
            .with_target("/tmp/vigil-test.txt")
            .with_description("Write a scratch file"),
    )
}

/// An agent action with a fixed id.
#[must_use]
pub fn test_agent_action_with_id(id: &str, risk: RiskLevel) -> Action {
    Action::from(
        AgentAction::new("test-agent", "file_write", risk)
            .with_id(id)
            .with_target("/tmp/vigil-test.txt"),
    )
}

/// A shell command action targeting `command`.
#[must_use]
pub fn test_shell_action(command: &str, risk: RiskLevel) -> Action {
    Action::from(
        AgentAction::new("test-agent", "shell_command", risk)
            .with_target(command)
            .with_description(format!("Run `{command}`")),
    )
}

/// A tool call at `risk`.
#[must_use]
pub fn test_tool_call(risk: RiskLevel) -> Action {
    Action::from(
        ToolCall::new("github", "create_issue", risk)
            .with_arguments(serde_json::json!({"title": "test"}))
            .with_description("Open an issue"),
    )
}

/// A pending approval for `id` whose expiry is already past.
#[must_use]
pub fn test_expired_pending(id: &str) -> PendingApproval {
    PendingApproval::new(
        ActionSource::AgentShield,
        test_agent_action_with_id(id, RiskLevel::Medium),
    )
    .expires_at(Timestamp::now().saturating_sub(Duration::seconds(1)))
}

/// A rule applying `outcome` to every action at `risk`.
#[must_use]
pub fn test_risk_rule(
    name: &str,
    priority: u32,
    risk: RiskLevel,
    outcome: RuleOutcome,
) -> NewRule {
    NewRule::new(name, outcome)
        .with_priority(priority)
        .with_condition(Condition::equals(ConditionField::RiskLevel, risk.as_str()))
}
