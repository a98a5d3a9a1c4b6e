//! Rule validation at the store write boundary.
//!
//! Everything the engine would otherwise have to fail closed on at runtime
//! (unknown names, operator/value mismatches, bad patterns) is rejected here,
//! so well-formed stores never feed the engine a condition that cannot match.

use regex::RegexBuilder;
use vigil_core::{ActionSource, RiskLevel};

use crate::condition::{Condition, ConditionField, ConditionOperator, ConditionValue};
use crate::error::{RuleError, RuleResult};
use crate::rule::Rule;

/// Highest accepted rule priority.
pub const MAX_PRIORITY: u32 = 1000;

/// Longest accepted rule name, in characters.
pub const MAX_NAME_LEN: usize = 128;

/// Size limits applied to rule definitions and regex evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLimits {
    /// Maximum conditions per rule.
    pub max_conditions: usize,
    /// Maximum `matches_regex` pattern length, in bytes.
    pub max_pattern_len: usize,
    /// Compiled regex program size budget, in bytes.
    pub regex_size_limit: usize,
    /// Inspected text is truncated to this many bytes before matching.
    pub max_haystack_len: usize,
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self {
            max_conditions: 32,
            max_pattern_len: 512,
            regex_size_limit: 262_144,
            max_haystack_len: 65_536,
        }
    }
}

/// Build a case-insensitive regex under the configured size budget.
pub(crate) fn build_regex(pattern: &str, limits: &RuleLimits) -> Result<regex::Regex, String> {
    if pattern.len() > limits.max_pattern_len {
        return Err(format!(
            "pattern is {} bytes, limit is {}",
            pattern.len(),
            limits.max_pattern_len
        ));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(limits.regex_size_limit)
        .dfa_size_limit(limits.regex_size_limit)
        .build()
        .map_err(|e| e.to_string())
}

/// Validate a complete rule.
///
/// # Errors
///
/// Returns [`RuleError::Validation`] naming the first offending field.
pub fn validate_rule(rule: &Rule, limits: &RuleLimits) -> RuleResult<()> {
    let name = rule.name.trim();
    if name.is_empty() {
        return Err(RuleError::validation("name", "must not be empty"));
    }
    if rule.name.chars().count() > MAX_NAME_LEN {
        return Err(RuleError::validation(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    if rule.priority > MAX_PRIORITY {
        return Err(RuleError::validation(
            "priority",
            format!("{} is outside 0..={MAX_PRIORITY}", rule.priority),
        ));
    }
    if rule.conditions.len() > limits.max_conditions {
        return Err(RuleError::validation(
            "conditions",
            format!(
                "{} conditions, limit is {}",
                rule.conditions.len(),
                limits.max_conditions
            ),
        ));
    }
    for (i, condition) in rule.conditions.iter().enumerate() {
        validate_condition(condition, limits).map_err(|(part, message)| {
            RuleError::validation(format!("conditions[{i}].{part}"), message)
        })?;
    }
    Ok(())
}

/// Validate one condition. On failure returns the sub-field and message.
fn validate_condition(
    condition: &Condition,
    limits: &RuleLimits,
) -> Result<(), (&'static str, String)> {
    let Condition {
        field,
        operator,
        value,
    } = condition;

    if *field == ConditionField::Unknown {
        return Err(("field", "unknown field".to_string()));
    }
    if *operator == ConditionOperator::Unknown {
        return Err(("operator", "unknown operator".to_string()));
    }

    let mismatch = |expected: &str| {
        Err((
            "value",
            format!("{operator} expects {expected}, got {}", value.kind()),
        ))
    };

    match operator {
        ConditionOperator::Equals | ConditionOperator::NotEquals => {
            if matches!(value, ConditionValue::List(_)) {
                return mismatch("a single value");
            }
            if let ConditionValue::String(s) = value {
                check_known_name(*field, s)?;
            }
        },
        op if op.is_ordering() => {
            if value.as_number().is_none() {
                return mismatch("a number");
            }
            if !field.is_numeric() {
                return Err((
                    "operator",
                    format!("{operator} needs a numeric field, {field} is not"),
                ));
            }
        },
        ConditionOperator::Contains | ConditionOperator::NotContains => {
            if !matches!(value, ConditionValue::String(_)) {
                return mismatch("a string");
            }
            if field.is_numeric() {
                return Err(("operator", format!("{operator} does not apply to {field}")));
            }
        },
        ConditionOperator::In | ConditionOperator::NotIn => {
            let ConditionValue::List(items) = value else {
                return mismatch("a list");
            };
            for item in items {
                check_known_name(*field, item)?;
            }
        },
        ConditionOperator::MatchesRegex => {
            let ConditionValue::String(pattern) = value else {
                return mismatch("a pattern string");
            };
            if field.is_numeric() {
                return Err(("operator", format!("{operator} does not apply to {field}")));
            }
            build_regex(pattern, limits).map_err(|e| ("value", e))?;
        },
        _ => {},
    }
    Ok(())
}

/// Reject literals that can never equal an enumerated field's value.
fn check_known_name(field: ConditionField, value: &str) -> Result<(), (&'static str, String)> {
    let known = match field {
        ConditionField::RiskLevel => value.parse::<RiskLevel>().is_ok_and(|r| r.as_str() == value),
        ConditionField::Source => value.parse::<ActionSource>().is_ok(),
        _ => true,
    };
    if known {
        Ok(())
    } else {
        Err(("value", format!("{value:?} is not a valid {field}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{NewRule, RuleOutcome};

    fn rule_with(condition: Condition) -> Rule {
        Rule::from_new(NewRule::new("r", RuleOutcome::RequireApproval).with_condition(condition))
    }

    fn field_of(err: RuleError) -> String {
        match err {
            RuleError::Validation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_rule_passes() {
        let rule = rule_with(Condition::equals(ConditionField::RiskLevel, "high"));
        assert!(validate_rule(&rule, &RuleLimits::default()).is_ok());
    }

    #[test]
    fn test_rejects_priority_out_of_range() {
        let mut rule = rule_with(Condition::equals(ConditionField::RiskLevel, "high"));
        rule.priority = 1001;
        let err = validate_rule(&rule, &RuleLimits::default()).unwrap_err();
        assert_eq!(field_of(err), "priority");
    }

    #[test]
    fn test_rejects_blank_and_long_names() {
        let mut rule = rule_with(Condition::equals(ConditionField::RiskLevel, "high"));
        rule.name = "  ".into();
        assert_eq!(
            field_of(validate_rule(&rule, &RuleLimits::default()).unwrap_err()),
            "name"
        );
        rule.name = "x".repeat(129);
        assert_eq!(
            field_of(validate_rule(&rule, &RuleLimits::default()).unwrap_err()),
            "name"
        );
    }

    #[test]
    fn test_rejects_unknown_field_and_operator() {
        let rule = rule_with(Condition::equals(ConditionField::Unknown, "x"));
        assert_eq!(
            field_of(validate_rule(&rule, &RuleLimits::default()).unwrap_err()),
            "conditions[0].field"
        );
        let rule = rule_with(Condition::new(
            ConditionField::Agent,
            ConditionOperator::Unknown,
            "x",
        ));
        assert_eq!(
            field_of(validate_rule(&rule, &RuleLimits::default()).unwrap_err()),
            "conditions[0].operator"
        );
    }

    #[test]
    fn test_rejects_operator_value_mismatch() {
        let limits = RuleLimits::default();
        let ordering_on_text = rule_with(Condition::new(
            ConditionField::RiskScore,
            ConditionOperator::GreaterThan,
            "high",
        ));
        assert!(validate_rule(&ordering_on_text, &limits).is_err());

        let in_without_list = rule_with(Condition::new(
            ConditionField::Agent,
            ConditionOperator::In,
            "claude-code",
        ));
        assert!(validate_rule(&in_without_list, &limits).is_err());

        let ordering_on_text_field = rule_with(Condition::new(
            ConditionField::Description,
            ConditionOperator::LessThan,
            3.0,
        ));
        assert!(validate_rule(&ordering_on_text_field, &limits).is_err());
    }

    #[test]
    fn test_rejects_unknown_risk_level_literal() {
        let rule = rule_with(Condition::equals(ConditionField::RiskLevel, "severe"));
        assert!(validate_rule(&rule, &RuleLimits::default()).is_err());
    }

    #[test]
    fn test_rejects_bad_and_oversized_patterns() {
        let limits = RuleLimits {
            max_pattern_len: 8,
            ..RuleLimits::default()
        };
        let bad = rule_with(Condition::matches_regex(ConditionField::Target, "(unclosed"));
        assert!(validate_rule(&bad, &limits).is_err());
        let long = rule_with(Condition::matches_regex(ConditionField::Target, "abcdefghij"));
        assert!(validate_rule(&long, &limits).is_err());
    }

    #[test]
    fn test_rejects_too_many_conditions() {
        let limits = RuleLimits {
            max_conditions: 1,
            ..RuleLimits::default()
        };
        let mut rule = rule_with(Condition::equals(ConditionField::RiskLevel, "high"));
        rule.conditions
            .push(Condition::equals(ConditionField::Source, "mcp_gateway"));
        assert_eq!(
            field_of(validate_rule(&rule, &limits).unwrap_err()),
            "conditions"
        );
    }
}
