//! Vigil Rules - Prioritized rule matching with a fail-closed default policy.
//!
//! This crate provides:
//! - The rule model: [`Rule`], [`Condition`], [`RuleOutcome`]
//! - Write-boundary validation ([`validate_rule`], [`RuleLimits`])
//! - Compilation of rules into matchers, once per rule change ([`RuleSet`])
//! - The pure evaluator [`RuleEngine`] and the risk-based [`default_policy`]
//! - The canonical seed set ([`default_rules`])
//! - Persistence through the [`RuleStore`] trait ([`KvRuleStore`])
//!
//! # Example
//!
//! ```
//! use vigil_core::{Action, AgentAction, RiskLevel};
//! use vigil_rules::{
//!     Condition, ConditionField, NewRule, Rule, RuleEngine, RuleLimits, RuleOutcome, RuleSet,
//! };
//!
//! let rule = Rule::from_new(
//!     NewRule::new("Block secrets", RuleOutcome::AutoReject)
//!         .with_priority(500)
//!         .with_condition(Condition::contains(ConditionField::Concerns, "credential_access")),
//! );
//! let rules = RuleSet::compile(vec![rule], &RuleLimits::default());
//!
//! let action = Action::from(
//!     AgentAction::new("claude-code", "file_read", RiskLevel::Low)
//!         .with_concern("credential_access"),
//! );
//! let result = RuleEngine::default().evaluate(&action, rules.rules());
//! assert_eq!(result.outcome, RuleOutcome::AutoReject);
//! assert!(!result.is_default);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod compile;
pub mod condition;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod rule;
pub mod store;
pub mod validate;

pub use compile::{CompiledCondition, CompiledRule, Fingerprint, RuleSet};
pub use condition::{Condition, ConditionField, ConditionOperator, ConditionValue};
pub use defaults::{DESTRUCTIVE_COMMAND_PATTERN, default_rules};
pub use engine::{EvaluationResult, RuleEngine, default_policy};
pub use error::{RuleError, RuleResult};
pub use rule::{NewRule, Rule, RuleOutcome, RuleUpdate, sort_by_precedence};
pub use store::{KvRuleStore, RuleStore, seed_if_empty};
pub use validate::{MAX_NAME_LEN, MAX_PRIORITY, RuleLimits, validate_rule};
