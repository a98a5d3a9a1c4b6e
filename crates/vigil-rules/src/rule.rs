//! Rule definitions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use vigil_core::{RuleId, Timestamp};

use crate::condition::Condition;

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Approve without review.
    AutoApprove,
    /// Reject without review.
    AutoReject,
    /// Queue for a human decision.
    RequireApproval,
}

impl RuleOutcome {
    /// Whether the outcome is decided without a reviewer.
    #[must_use]
    pub fn is_automatic(self) -> bool {
        !matches!(self, Self::RequireApproval)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoApprove => write!(f, "auto_approve"),
            Self::AutoReject => write!(f, "auto_reject"),
            Self::RequireApproval => write!(f, "require_approval"),
        }
    }
}

/// A stored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: RuleId,
    /// Display name.
    pub name: String,
    /// Precedence; higher wins.
    pub priority: u32,
    /// Disabled rules are stored but never evaluated.
    pub enabled: bool,
    /// Clauses joined with AND. Empty matches everything.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Decision when the rule matches.
    pub outcome: RuleOutcome,
    /// Reason recorded on decisions made by this rule.
    #[serde(default)]
    pub reason: Option<String>,
    /// When the rule was created.
    pub created_at: Timestamp,
    /// When the rule was last changed.
    pub updated_at: Timestamp,
}

impl Rule {
    /// Build a rule from a draft, assigning a fresh id and timestamps.
    #[must_use]
    pub fn from_new(new: NewRule) -> Self {
        Self::with_id(RuleId::new(), new, Timestamp::now())
    }

    /// Build a rule from a draft with an explicit id and creation time.
    #[must_use]
    pub fn with_id(id: RuleId, new: NewRule, now: Timestamp) -> Self {
        Self {
            id,
            name: new.name,
            priority: new.priority,
            enabled: new.enabled,
            conditions: new.conditions,
            outcome: new.outcome,
            reason: new.reason,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: RuleUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(conditions) = update.conditions {
            self.conditions = conditions;
        }
        if let Some(outcome) = update.outcome {
            self.outcome = outcome;
        }
        if let Some(reason) = update.reason {
            self.reason = reason;
        }
        self.updated_at = Timestamp::now().max(self.updated_at);
    }

    /// Evaluation order: priority descending, then oldest first, then id.
    #[must_use]
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort rules into evaluation order.
pub fn sort_by_precedence(rules: &mut [Rule]) {
    rules.sort_by(Rule::precedence_cmp);
}

/// Fields supplied when creating a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    /// Display name.
    pub name: String,
    /// Precedence; higher wins.
    #[serde(default)]
    pub priority: u32,
    /// Whether the rule is evaluated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Clauses joined with AND.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Decision when the rule matches.
    pub outcome: RuleOutcome,
    /// Reason recorded on decisions.
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl NewRule {
    /// Start an enabled, unconditional draft at priority 0.
    #[must_use]
    pub fn new(name: impl Into<String>, outcome: RuleOutcome) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            enabled: true,
            conditions: Vec::new(),
            outcome,
            reason: None,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the decision reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Mark the draft disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Partial update to a rule. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<u32>,
    /// New enabled flag.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Replacement condition list.
    #[serde(default)]
    pub conditions: Option<Vec<Condition>>,
    /// New outcome.
    #[serde(default)]
    pub outcome: Option<RuleOutcome>,
    /// New reason; `Some(None)` clears it.
    #[serde(default)]
    pub reason: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rule(name: &str, priority: u32) -> Rule {
        Rule::from_new(NewRule::new(name, RuleOutcome::AutoApprove).with_priority(priority))
    }

    #[test]
    fn test_precedence_priority_desc() {
        let mut rules = vec![rule("low", 10), rule("high", 100), rule("mid", 50)];
        sort_by_precedence(&mut rules);
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["high", "mid", "low"]);
    }

    #[test]
    fn test_precedence_ties_by_age_then_id() {
        let now = Timestamp::now();
        let older = Rule::with_id(
            RuleId::from_name("b"),
            NewRule::new("older", RuleOutcome::AutoReject).with_priority(5),
            now.saturating_sub(Duration::seconds(10)),
        );
        let newer = Rule::with_id(
            RuleId::from_name("a"),
            NewRule::new("newer", RuleOutcome::AutoApprove).with_priority(5),
            now,
        );
        let mut rules = vec![newer.clone(), older.clone()];
        sort_by_precedence(&mut rules);
        assert_eq!(rules[0].name, "older");

        let twin_a = Rule::with_id(
            RuleId::from_name("x"),
            NewRule::new("x", RuleOutcome::AutoApprove),
            now,
        );
        let twin_b = Rule::with_id(
            RuleId::from_name("y"),
            NewRule::new("y", RuleOutcome::AutoApprove),
            now,
        );
        let expected_first = twin_a.id.min(twin_b.id);
        let mut twins = vec![twin_b, twin_a];
        sort_by_precedence(&mut twins);
        assert_eq!(twins[0].id, expected_first);
    }

    #[test]
    fn test_apply_update() {
        let mut r = rule("r", 1);
        let before = r.updated_at;
        r.apply(RuleUpdate {
            priority: Some(7),
            enabled: Some(false),
            reason: Some(Some("why".into())),
            ..RuleUpdate::default()
        });
        assert_eq!(r.priority, 7);
        assert!(!r.enabled);
        assert_eq!(r.reason.as_deref(), Some("why"));
        assert!(r.updated_at >= before);
    }

    #[test]
    fn test_new_rule_defaults_enabled() {
        let n: NewRule =
            serde_json::from_str(r#"{"name":"n","outcome":"auto_reject"}"#).unwrap();
        assert!(n.enabled);
        assert_eq!(n.priority, 0);
    }
}
