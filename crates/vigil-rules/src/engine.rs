//! Prioritized rule evaluation.
//!
//! [`RuleEngine::evaluate`] walks compiled rules in the order given and
//! returns the outcome of the first enabled rule whose conditions all match.
//! When none match, the outcome comes from [`default_policy`], which looks at
//! the action's risk level only.
//!
//! Evaluation is total: it always returns an outcome, never errors, and never
//! touches shared state. Conditions that cannot be evaluated for an action
//! (a tool-call-only field on an agent action, a number compared with text)
//! are false, whether or not the operator is a negation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::{Action, RiskLevel};

use crate::compile::{CompiledCondition, CompiledRule, Matcher, Scalar, compare};
use crate::condition::ConditionField;
use crate::rule::{Rule, RuleOutcome};
use crate::validate::RuleLimits;

/// Result of evaluating an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The outcome to apply.
    pub outcome: RuleOutcome,
    /// The rule that produced the outcome, if any.
    pub matched_rule: Option<Rule>,
    /// Whether the outcome came from the default policy.
    pub is_default: bool,
    /// Reason to record on an automatic decision.
    pub reason: String,
}

impl EvaluationResult {
    /// A result produced by the default policy.
    #[must_use]
    pub fn from_default(risk_level: RiskLevel) -> Self {
        Self {
            outcome: default_policy(risk_level),
            matched_rule: None,
            is_default: true,
            reason: format!("default policy for {risk_level} risk"),
        }
    }

    fn from_rule(rule: &Rule) -> Self {
        let reason = rule
            .reason
            .clone()
            .unwrap_or_else(|| format!("matched rule '{}'", rule.name));
        Self {
            outcome: rule.outcome,
            matched_rule: Some(rule.clone()),
            is_default: false,
            reason,
        }
    }
}

/// Outcome used when no rule matches.
#[must_use]
pub fn default_policy(risk_level: RiskLevel) -> RuleOutcome {
    match risk_level {
        RiskLevel::Low => RuleOutcome::AutoApprove,
        RiskLevel::Medium | RiskLevel::High => RuleOutcome::RequireApproval,
        RiskLevel::Critical => RuleOutcome::AutoReject,
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    limits: RuleLimits,
}

impl RuleEngine {
    /// Create an engine with the given limits.
    #[must_use]
    pub fn new(limits: RuleLimits) -> Self {
        Self { limits }
    }

    /// The limits this engine compiles and matches under.
    #[must_use]
    pub fn limits(&self) -> &RuleLimits {
        &self.limits
    }

    /// Evaluate an action against rules already in precedence order.
    #[must_use]
    pub fn evaluate(&self, action: &Action, rules: &[CompiledRule]) -> EvaluationResult {
        for compiled in rules {
            let rule = compiled.rule();
            if !rule.enabled {
                continue;
            }
            if compiled
                .conditions()
                .iter()
                .all(|c| self.condition_matches(c, action))
            {
                debug!(
                    action_id = %action.id(),
                    rule_id = %rule.id,
                    outcome = %rule.outcome,
                    "rule matched"
                );
                return EvaluationResult::from_rule(rule);
            }
        }

        let result = EvaluationResult::from_default(action.risk_level());
        debug!(
            action_id = %action.id(),
            risk = %action.risk_level(),
            outcome = %result.outcome,
            "no rule matched, using default policy"
        );
        result
    }

    fn condition_matches(&self, condition: &CompiledCondition, action: &Action) -> bool {
        let value = resolve(condition.field, action);
        let outcome = match &condition.matcher {
            Matcher::Never => None,
            Matcher::Equals(s) => scalar_eq(&value, s),
            Matcher::NotEquals(s) => scalar_eq(&value, s).map(|eq| !eq),
            Matcher::Compare(op, rhs) => value.as_number().map(|lhs| compare(*op, lhs, *rhs)),
            Matcher::Contains(needle) => contains(&value, needle),
            Matcher::NotContains(needle) => contains(&value, needle).map(|c| !c),
            Matcher::In(items) => one_of(&value, items),
            Matcher::NotIn(items) => one_of(&value, items).map(|c| !c),
            Matcher::Regex(re) => match &value {
                FieldValue::Text(t) => Some(re.is_match(truncate(t, self.limits.max_haystack_len))),
                FieldValue::List(items) => Some(
                    items
                        .iter()
                        .any(|t| re.is_match(truncate(t, self.limits.max_haystack_len))),
                ),
                FieldValue::Number(_) | FieldValue::Missing => None,
            },
        };
        // Incomparable operands fail closed.
        outcome.unwrap_or(false)
    }
}

/// An action attribute as seen by a condition.
#[derive(Debug)]
enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    List(&'a [String]),
    Missing,
}

impl FieldValue<'_> {
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => t.trim().parse().ok(),
            Self::List(_) | Self::Missing => None,
        }
    }
}

fn resolve(field: ConditionField, action: &Action) -> FieldValue<'_> {
    match (field, action) {
        (ConditionField::RiskLevel, _) => FieldValue::Text(action.risk_level().as_str()),
        (ConditionField::RiskScore, _) => FieldValue::Number(f64::from(action.risk_level().rank())),
        (ConditionField::Source, _) => FieldValue::Text(action.source().as_str()),
        (ConditionField::ActionType, _) => FieldValue::Text(action.action_type()),
        (ConditionField::Description, _) => FieldValue::Text(action.description()),
        (ConditionField::Concerns, _) => FieldValue::List(action.concerns()),
        (ConditionField::ConcernCount, _) => u32::try_from(action.concerns().len())
            .map_or(FieldValue::Missing, |n| FieldValue::Number(f64::from(n))),
        (ConditionField::Agent, Action::Agent(a)) => FieldValue::Text(&a.agent),
        (ConditionField::Target, Action::Agent(a)) => {
            a.target.as_deref().map_or(FieldValue::Missing, FieldValue::Text)
        },
        (ConditionField::ServerName, Action::ToolCall(t)) => FieldValue::Text(&t.server_name),
        (ConditionField::ToolName, Action::ToolCall(t)) => FieldValue::Text(&t.tool_name),
        (
            ConditionField::Agent
            | ConditionField::Target
            | ConditionField::ServerName
            | ConditionField::ToolName
            | ConditionField::Unknown,
            _,
        ) => FieldValue::Missing,
    }
}

fn scalar_eq(value: &FieldValue<'_>, expected: &Scalar) -> Option<bool> {
    match (value, expected) {
        (FieldValue::Text(t), Scalar::Text(s)) => Some(*t == s.as_str()),
        (FieldValue::Number(n), Scalar::Number(m)) => {
            Some(n.partial_cmp(m) == Some(std::cmp::Ordering::Equal))
        },
        (FieldValue::Number(n), Scalar::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .map(|m| n.partial_cmp(&m) == Some(std::cmp::Ordering::Equal)),
        _ => None,
    }
}

fn contains(value: &FieldValue<'_>, needle: &str) -> Option<bool> {
    match value {
        FieldValue::Text(t) => Some(t.contains(needle)),
        FieldValue::List(items) => Some(items.iter().any(|i| i == needle)),
        FieldValue::Number(_) | FieldValue::Missing => None,
    }
}

fn one_of(value: &FieldValue<'_>, items: &[String]) -> Option<bool> {
    match value {
        FieldValue::Text(t) => Some(items.iter().any(|i| i == t)),
        FieldValue::Number(n) => Some(items.iter().any(|i| {
            i.trim()
                .parse::<f64>()
                .is_ok_and(|m| n.partial_cmp(&m) == Some(std::cmp::Ordering::Equal))
        })),
        FieldValue::List(values) => Some(values.iter().any(|v| items.contains(v))),
        FieldValue::Missing => None,
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let end = (0..=max)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    text.get(..end).unwrap_or_default()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
