//! Compiled rules.
//!
//! Rules are turned into matchers once, when they are loaded, so evaluation
//! never parses a pattern or inspects a literal's type. A condition that
//! cannot be compiled (unknown name, operator/value mismatch, broken regex)
//! becomes a matcher that never matches, and a warning is logged once here
//! instead of on every evaluation.

use regex::Regex;
use std::cmp::Ordering;
use tracing::warn;

use vigil_core::{RuleId, Timestamp};

use crate::condition::{Condition, ConditionField, ConditionOperator, ConditionValue};
use crate::rule::Rule;
use crate::validate::{RuleLimits, build_regex};

/// A single-valued literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// Compiled form of a condition's operator and value.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    /// Fails closed.
    Never,
    Equals(Scalar),
    NotEquals(Scalar),
    Compare(ConditionOperator, f64),
    Contains(String),
    NotContains(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Regex(Regex),
}

/// A condition ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub(crate) field: ConditionField,
    pub(crate) matcher: Matcher,
}

impl CompiledCondition {
    /// Compile a condition. Never fails; see the module docs.
    #[must_use]
    pub fn compile(condition: &Condition, rule: &Rule, limits: &RuleLimits) -> Self {
        let matcher = match Self::build(condition, limits) {
            Ok(matcher) => matcher,
            Err(problem) => {
                warn!(
                    rule_id = %rule.id,
                    rule = %rule.name,
                    condition = %condition,
                    problem = %problem,
                    "condition can never match"
                );
                Matcher::Never
            },
        };
        Self {
            field: condition.field,
            matcher,
        }
    }

    /// Whether the condition was compiled into a never-matching matcher.
    #[must_use]
    pub fn is_never(&self) -> bool {
        matches!(self.matcher, Matcher::Never)
    }

    fn build(condition: &Condition, limits: &RuleLimits) -> Result<Matcher, String> {
        if condition.field == ConditionField::Unknown {
            return Err("unknown field".into());
        }
        let value = &condition.value;
        let op = condition.operator;
        let matcher = match op {
            ConditionOperator::Equals => Matcher::Equals(scalar(value)?),
            ConditionOperator::NotEquals => Matcher::NotEquals(scalar(value)?),
            ConditionOperator::GreaterThan
            | ConditionOperator::LessThan
            | ConditionOperator::GreaterThanOrEquals
            | ConditionOperator::LessThanOrEquals => {
                let n = value
                    .as_number()
                    .ok_or_else(|| format!("{op} needs a number, got {}", value.kind()))?;
                Matcher::Compare(op, n)
            },
            ConditionOperator::Contains => Matcher::Contains(text(value, op)?),
            ConditionOperator::NotContains => Matcher::NotContains(text(value, op)?),
            ConditionOperator::In => Matcher::In(list(value, op)?),
            ConditionOperator::NotIn => Matcher::NotIn(list(value, op)?),
            ConditionOperator::MatchesRegex => {
                Matcher::Regex(build_regex(&text(value, op)?, limits)?)
            },
            ConditionOperator::Unknown => return Err("unknown operator".into()),
        };
        Ok(matcher)
    }
}

fn scalar(value: &ConditionValue) -> Result<Scalar, String> {
    match value {
        ConditionValue::String(s) => Ok(Scalar::Text(s.clone())),
        ConditionValue::Number(n) => Ok(Scalar::Number(*n)),
        ConditionValue::Bool(b) => Ok(Scalar::Bool(*b)),
        ConditionValue::List(_) => Err("equality needs a single value, got list".into()),
    }
}

fn text(value: &ConditionValue, op: ConditionOperator) -> Result<String, String> {
    match value {
        ConditionValue::String(s) => Ok(s.clone()),
        other => Err(format!("{op} needs a string, got {}", other.kind())),
    }
}

fn list(value: &ConditionValue, op: ConditionOperator) -> Result<Vec<String>, String> {
    match value {
        ConditionValue::List(items) => Ok(items.clone()),
        other => Err(format!("{op} needs a list, got {}", other.kind())),
    }
}

/// A rule with its conditions compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    conditions: Vec<CompiledCondition>,
}

impl CompiledRule {
    /// Compile a rule.
    #[must_use]
    pub fn compile(rule: Rule, limits: &RuleLimits) -> Self {
        let conditions = rule
            .conditions
            .iter()
            .map(|c| CompiledCondition::compile(c, &rule, limits))
            .collect();
        Self { rule, conditions }
    }

    /// The source rule.
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The compiled conditions, in rule order.
    #[must_use]
    pub fn conditions(&self) -> &[CompiledCondition] {
        &self.conditions
    }
}

/// Identity of a rule list: ids and last-change times in evaluation order.
pub type Fingerprint = Vec<(RuleId, Timestamp)>;

/// An ordered list of compiled rules plus the fingerprint it was built from.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    fingerprint: Fingerprint,
    limits: Option<RuleLimits>,
}

impl RuleSet {
    /// Compile rules, keeping the caller's order.
    #[must_use]
    pub fn compile(rules: Vec<Rule>, limits: &RuleLimits) -> Self {
        let fingerprint = Self::fingerprint_of(&rules);
        let rules = rules
            .into_iter()
            .map(|r| CompiledRule::compile(r, limits))
            .collect();
        Self {
            rules,
            fingerprint,
            limits: Some(*limits),
        }
    }

    /// Compute the fingerprint of a rule list.
    #[must_use]
    pub fn fingerprint_of(rules: &[Rule]) -> Fingerprint {
        rules.iter().map(|r| (r.id, r.updated_at)).collect()
    }

    /// Whether this set was compiled from exactly these rules and limits.
    #[must_use]
    pub fn is_current(&self, rules: &[Rule], limits: &RuleLimits) -> bool {
        self.limits.as_ref() == Some(limits)
            && self.fingerprint.len() == rules.len()
            && self
                .fingerprint
                .iter()
                .zip(rules)
                .all(|((id, at), r)| *id == r.id && *at == r.updated_at)
    }

    /// The compiled rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Apply a numeric comparison operator.
pub(crate) fn compare(op: ConditionOperator, lhs: f64, rhs: f64) -> bool {
    let Some(ord) = lhs.partial_cmp(&rhs) else {
        return false;
    };
    match op {
        ConditionOperator::GreaterThan => ord == Ordering::Greater,
        ConditionOperator::LessThan => ord == Ordering::Less,
        ConditionOperator::GreaterThanOrEquals => ord != Ordering::Less,
        ConditionOperator::LessThanOrEquals => ord != Ordering::Greater,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{NewRule, RuleOutcome};

    fn rule_with(condition: Condition) -> Rule {
        Rule::from_new(NewRule::new("r", RuleOutcome::AutoReject).with_condition(condition))
    }

    #[test]
    fn test_broken_regex_compiles_to_never() {
        let rule = rule_with(Condition::matches_regex(ConditionField::Target, "(oops"));
        let compiled = CompiledRule::compile(rule, &RuleLimits::default());
        assert!(compiled.conditions()[0].is_never());
    }

    #[test]
    fn test_mismatched_value_compiles_to_never() {
        let rule = rule_with(Condition::new(
            ConditionField::RiskScore,
            ConditionOperator::GreaterThan,
            ConditionValue::List(vec!["1".into()]),
        ));
        let compiled = CompiledRule::compile(rule, &RuleLimits::default());
        assert!(compiled.conditions()[0].is_never());
    }

    #[test]
    fn test_valid_condition_is_not_never() {
        let rule = rule_with(Condition::equals(ConditionField::RiskLevel, "low"));
        let compiled = CompiledRule::compile(rule, &RuleLimits::default());
        assert!(!compiled.conditions()[0].is_never());
    }

    #[test]
    fn test_rule_set_fingerprint_tracks_updates() {
        let limits = RuleLimits::default();
        let mut rules = vec![rule_with(Condition::equals(ConditionField::RiskLevel, "low"))];
        let set = RuleSet::compile(rules.clone(), &limits);
        assert!(set.is_current(&rules, &limits));

        rules[0].updated_at = rules[0]
            .updated_at
            .saturating_add(chrono::Duration::seconds(1));
        assert!(!set.is_current(&rules, &limits));
        assert!(!set.is_current(&[], &limits));
    }

    #[test]
    fn test_compare() {
        assert!(compare(ConditionOperator::GreaterThan, 3.0, 2.0));
        assert!(compare(ConditionOperator::LessThanOrEquals, 2.0, 2.0));
        assert!(!compare(ConditionOperator::LessThan, f64::NAN, 2.0));
    }
}
