//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_rules::prelude::*;` to import all essential types.

// Errors
pub use crate::{RuleError, RuleResult};

// Rule model
pub use crate::{Condition, ConditionField, ConditionOperator, ConditionValue};
pub use crate::{NewRule, Rule, RuleOutcome, RuleUpdate};

// Evaluation
pub use crate::{EvaluationResult, RuleEngine, RuleLimits, RuleSet};

// Storage
pub use crate::{KvRuleStore, RuleStore};
