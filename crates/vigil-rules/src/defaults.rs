//! The canonical rule set seeded into an empty store.
//!
//! Ids are derived from rule names, so seeding the same set twice (or from
//! two processes at once) writes the same keys and never duplicates a rule.

use vigil_core::{RuleId, Timestamp};

use crate::condition::{Condition, ConditionField, ConditionOperator};
use crate::rule::{NewRule, Rule, RuleOutcome};

/// Target patterns for commands that destroy filesystems or whole trees.
pub const DESTRUCTIVE_COMMAND_PATTERN: &str =
    r"\brm\s+-[a-z]*(?:rf|fr)[a-z]*\s+/(?:\s|\*|$)|\bmkfs\b|\bdd\s+if=";

/// Build the default rules, all created at `now`.
#[must_use]
pub fn default_rules(now: Timestamp) -> Vec<Rule> {
    let drafts = [
        NewRule::new("Block critical risk", RuleOutcome::AutoReject)
            .with_priority(1000)
            .with_condition(Condition::equals(ConditionField::RiskLevel, "critical"))
            .with_reason("critical risk actions are never allowed"),
        NewRule::new("Block destructive shell commands", RuleOutcome::AutoReject)
            .with_priority(900)
            .with_condition(Condition::matches_regex(
                ConditionField::Target,
                DESTRUCTIVE_COMMAND_PATTERN,
            ))
            .with_reason("destructive command blocked"),
        NewRule::new("Review credential access", RuleOutcome::RequireApproval)
            .with_priority(800)
            .with_condition(Condition::contains(
                ConditionField::Concerns,
                "credential_access",
            ))
            .with_reason("credential access needs review"),
        NewRule::new("Review high risk", RuleOutcome::RequireApproval)
            .with_priority(700)
            .with_condition(Condition::equals(ConditionField::RiskLevel, "high"))
            .with_reason("high risk action needs review"),
        NewRule::new("Review medium risk tool calls", RuleOutcome::RequireApproval)
            .with_priority(500)
            .with_condition(Condition::equals(ConditionField::Source, "mcp_gateway"))
            .with_condition(Condition::equals(ConditionField::RiskLevel, "medium"))
            .with_reason("medium risk tool call needs review"),
        NewRule::new("Auto-approve low risk", RuleOutcome::AutoApprove)
            .with_priority(100)
            .with_condition(Condition::new(
                ConditionField::RiskScore,
                ConditionOperator::LessThanOrEquals,
                1.0,
            ))
            .with_reason("low risk"),
    ];

    drafts
        .into_iter()
        .map(|draft| Rule::with_id(RuleId::from_name(&draft.name), draft, now))
        .collect()
}
