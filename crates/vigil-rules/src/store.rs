//! Rule persistence.
//!
//! [`RuleStore`] is the narrow interface the engine's callers read rules
//! through; [`KvRuleStore`] implements it on any [`KvStore`]. Every write is
//! validated first, so malformed definitions never reach the engine.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use vigil_core::RuleId;
use vigil_storage::{KvStore, ScopedKvStore};

use crate::error::{RuleError, RuleResult};
use crate::rule::{NewRule, Rule, RuleUpdate, sort_by_precedence};
use crate::validate::{RuleLimits, validate_rule};

/// Namespace holding serialized rules, keyed by UUID.
const NS_RULES: &str = "rules";

/// Storage for rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Enabled rules in evaluation order (priority descending, then oldest
    /// first, then id).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn get_enabled_rules_ordered_by_priority_desc(&self) -> RuleResult<Vec<Rule>>;

    /// Validate and store a new rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Validation`] for malformed drafts.
    async fn create_rule(&self, new: NewRule) -> RuleResult<Rule>;

    /// Validate and apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NotFound`] if the rule does not exist, or
    /// [`RuleError::Validation`] if the result is malformed.
    async fn update_rule(&self, id: RuleId, update: RuleUpdate) -> RuleResult<Rule>;

    /// Delete a rule. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete_rule(&self, id: RuleId) -> RuleResult<bool>;

    /// Get a rule by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn get_rule(&self, id: RuleId) -> RuleResult<Option<Rule>>;

    /// All rules, enabled or not, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn get_all_rules(&self) -> RuleResult<Vec<Rule>>;

    /// Number of stored rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn count(&self) -> RuleResult<usize>;

    /// Store a fully-formed rule unless its id is taken. Returns `true` if
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Validation`] for malformed rules.
    async fn insert_if_absent(&self, rule: Rule) -> RuleResult<bool>;
}

/// [`RuleStore`] on a key-value backend.
#[derive(Debug, Clone)]
pub struct KvRuleStore {
    rules: ScopedKvStore,
    limits: RuleLimits,
}

impl KvRuleStore {
    /// Create a store on `kv`, validating writes under `limits`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace cannot be bound.
    pub fn new(kv: Arc<dyn KvStore>, limits: RuleLimits) -> RuleResult<Self> {
        Ok(Self {
            rules: ScopedKvStore::new(kv, NS_RULES)?,
            limits,
        })
    }

    fn key(id: RuleId) -> String {
        id.0.to_string()
    }

    async fn load_sorted(&self) -> RuleResult<Vec<Rule>> {
        let mut rules: Vec<Rule> = self.rules.values_json().await?;
        sort_by_precedence(&mut rules);
        Ok(rules)
    }
}

#[async_trait]
impl RuleStore for KvRuleStore {
    async fn get_enabled_rules_ordered_by_priority_desc(&self) -> RuleResult<Vec<Rule>> {
        let mut rules = self.load_sorted().await?;
        rules.retain(|r| r.enabled);
        Ok(rules)
    }

    async fn create_rule(&self, new: NewRule) -> RuleResult<Rule> {
        let rule = Rule::from_new(new);
        validate_rule(&rule, &self.limits)?;
        self.rules.set_json(&Self::key(rule.id), &rule).await?;
        info!(rule_id = %rule.id, rule = %rule.name, priority = rule.priority, "rule created");
        Ok(rule)
    }

    async fn update_rule(&self, id: RuleId, update: RuleUpdate) -> RuleResult<Rule> {
        let key = Self::key(id);
        let mut rule: Rule = self
            .rules
            .get_json(&key)
            .await?
            .ok_or(RuleError::NotFound(id))?;
        rule.apply(update);
        validate_rule(&rule, &self.limits)?;
        self.rules.set_json(&key, &rule).await?;
        info!(rule_id = %id, "rule updated");
        Ok(rule)
    }

    async fn delete_rule(&self, id: RuleId) -> RuleResult<bool> {
        let existed = self.rules.delete(&Self::key(id)).await?;
        if existed {
            info!(rule_id = %id, "rule deleted");
        }
        Ok(existed)
    }

    async fn get_rule(&self, id: RuleId) -> RuleResult<Option<Rule>> {
        Ok(self.rules.get_json(&Self::key(id)).await?)
    }

    async fn get_all_rules(&self) -> RuleResult<Vec<Rule>> {
        self.load_sorted().await
    }

    async fn count(&self) -> RuleResult<usize> {
        Ok(self.rules.list_keys().await?.len())
    }

    async fn insert_if_absent(&self, rule: Rule) -> RuleResult<bool> {
        validate_rule(&rule, &self.limits)?;
        let written = self
            .rules
            .set_json_if_absent(&Self::key(rule.id), &rule)
            .await?;
        debug!(rule_id = %rule.id, written, "insert rule if absent");
        Ok(written)
    }
}

/// Seed `rules` into `store` if it holds no rules. Returns how many were written.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a rule cannot be written.
pub async fn seed_if_empty(store: &dyn RuleStore, rules: Vec<Rule>) -> RuleResult<usize> {
    if store.count().await? > 0 {
        debug!("rule store not empty, skipping seed");
        return Ok(0);
    }
    let mut written = 0usize;
    for rule in rules {
        if store.insert_if_absent(rule).await? {
            written = written.saturating_add(1);
        }
    }
    if written > 0 {
        info!(count = written, "seeded default rules");
    }
    Ok(written)
}
