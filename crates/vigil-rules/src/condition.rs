//! Rule conditions.
//!
//! A [`Condition`] compares one inspectable attribute of an action
//! ([`ConditionField`]) against a literal ([`ConditionValue`]) with a
//! [`ConditionOperator`]. The field and operator sets are closed; names that
//! a newer writer persisted but this build does not know deserialize as
//! `Unknown` and never match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute of an action a condition can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    /// Risk level name (`low`, `medium`, `high`, `critical`).
    RiskLevel,
    /// Numeric risk rank, 1 (low) to 4 (critical).
    RiskScore,
    /// Intake path (`agent_shield` or `mcp_gateway`).
    Source,
    /// Agent action kind, or `tool_call` for tool calls.
    ActionType,
    /// Agent name. Agent actions only.
    Agent,
    /// Path, URL, or command the action operates on. Agent actions only.
    Target,
    /// MCP server name. Tool calls only.
    ServerName,
    /// Tool name. Tool calls only.
    ToolName,
    /// Human-readable description.
    Description,
    /// Classifier concerns.
    Concerns,
    /// Number of classifier concerns.
    ConcernCount,
    /// A field name this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl ConditionField {
    /// The wire name of this field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RiskLevel => "risk_level",
            Self::RiskScore => "risk_score",
            Self::Source => "source",
            Self::ActionType => "action_type",
            Self::Agent => "agent",
            Self::Target => "target",
            Self::ServerName => "server_name",
            Self::ToolName => "tool_name",
            Self::Description => "description",
            Self::Concerns => "concerns",
            Self::ConcernCount => "concern_count",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the field resolves to a number.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::RiskScore | Self::ConcernCount)
    }

    /// Whether the field resolves to a list of strings.
    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, Self::Concerns)
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Primitive equality.
    Equals,
    /// Primitive inequality.
    NotEquals,
    /// Numeric `>`.
    GreaterThan,
    /// Numeric `<`.
    LessThan,
    /// Numeric `>=`.
    GreaterThanOrEquals,
    /// Numeric `<=`.
    LessThanOrEquals,
    /// Substring test on text, membership test on lists.
    Contains,
    /// Negated [`Contains`](Self::Contains).
    NotContains,
    /// The field value is one of the listed values.
    In,
    /// Negated [`In`](Self::In).
    NotIn,
    /// Case-insensitive regular expression match.
    MatchesRegex,
    /// An operator name this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl ConditionOperator {
    /// The wire name of this operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanOrEquals => "greater_than_or_equals",
            Self::LessThanOrEquals => "less_than_or_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::MatchesRegex => "matches_regex",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is one of the four numeric ordering operators.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::LessThan | Self::GreaterThanOrEquals | Self::LessThanOrEquals
        )
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal a condition compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// Text literal (also a regex pattern for `matches_regex`).
    String(String),
    /// List literal for `in` / `not_in`.
    List(Vec<String>),
}

impl ConditionValue {
    /// Interpret the value as a number, parsing numeric strings.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::List(_) => None,
        }
    }

    /// Short name of the value's type, for messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for ConditionValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for ConditionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<&[&str]> for ConditionValue {
    fn from(list: &[&str]) -> Self {
        Self::List(list.iter().map(ToString::to_string).collect())
    }
}

/// One clause of a rule. All of a rule's conditions must match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Attribute inspected.
    pub field: ConditionField,
    /// Comparison applied.
    pub operator: ConditionOperator,
    /// Literal compared against.
    pub value: ConditionValue,
}

impl Condition {
    /// Create a condition.
    #[must_use]
    pub fn new(
        field: ConditionField,
        operator: ConditionOperator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    /// `field equals value`.
    #[must_use]
    pub fn equals(field: ConditionField, value: impl Into<ConditionValue>) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    /// `field contains value`.
    #[must_use]
    pub fn contains(field: ConditionField, value: impl Into<ConditionValue>) -> Self {
        Self::new(field, ConditionOperator::Contains, value)
    }

    /// `field matches_regex pattern`.
    #[must_use]
    pub fn matches_regex(field: ConditionField, pattern: impl Into<String>) -> Self {
        Self::new(field, ConditionOperator::MatchesRegex, pattern.into())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ConditionValue::Bool(b) => write!(f, "{} {} {b}", self.field, self.operator),
            ConditionValue::Number(n) => write!(f, "{} {} {n}", self.field, self.operator),
            ConditionValue::String(s) => write!(f, "{} {} {s:?}", self.field, self.operator),
            ConditionValue::List(l) => write!(f, "{} {} {l:?}", self.field, self.operator),
        }
    }
}
