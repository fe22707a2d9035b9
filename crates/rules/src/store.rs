//! In-memory rule store shared between admin operations, the loader and
//! evaluation.
//!
//! Evaluation never borrows the live map: every call works on a
//! [`snapshot`](RuleStore::snapshot), so concurrent edits cannot reorder a
//! rule list mid-evaluation.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use triage_core::Priority;

use crate::evaluator::{self, EvaluationOptions, EvaluationResult};
use crate::input::{EvaluationInput, InputError};
use crate::priority::accumulate_priority;
use crate::schema::{default_true, Rule, RuleRecord};
use crate::validation::{validate_rule, ValidationResult};

/// Errors returned by [`RuleStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RuleStoreError {
    #[error("rule '{0}' not found")]
    NotFound(String),

    #[error("rule failed validation:\n{}", .0.summary())]
    Invalid(ValidationResult),

    #[error(transparent)]
    Input(#[from] InputError),
}

pub type Result<T> = std::result::Result<T, RuleStoreError>;

/// Fields an administrator supplies when creating a rule. The store assigns
/// the id and appends the rule after the current last position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "condition_type")]
    pub condition_type: String,
    #[serde(default, alias = "condition_value")]
    pub condition_value: String,
    #[serde(alias = "action_type")]
    pub action_type: String,
    #[serde(default, alias = "action_value")]
    pub action_value: String,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "condition_type")]
    pub condition_type: Option<String>,
    #[serde(alias = "condition_value")]
    pub condition_value: Option<String>,
    #[serde(alias = "action_type")]
    pub action_type: Option<String>,
    #[serde(alias = "action_value")]
    pub action_value: Option<String>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    pub position: Option<i64>,
}

impl RuleUpdate {
    fn apply(self, record: &mut RuleRecord) {
        if let Some(v) = self.name {
            record.name = v;
        }
        if let Some(v) = self.description {
            record.description = Some(v);
        }
        if let Some(v) = self.condition_type {
            record.condition_type = v;
        }
        if let Some(v) = self.condition_value {
            record.condition_value = v;
        }
        if let Some(v) = self.action_type {
            record.action_type = v;
        }
        if let Some(v) = self.action_value {
            record.action_value = v;
        }
        if let Some(v) = self.is_active {
            record.is_active = v;
        }
        if let Some(v) = self.position {
            record.position = v;
        }
    }
}

/// Outcome of previewing rules against a sample post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTestReport {
    /// Every tested rule is evaluated, even after a match.
    pub result: EvaluationResult,
    /// All matches folded onto the default priority.
    pub priority: Priority,
}

/// Thread-safe, cloneable handle to the rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Arc<RwLock<IndexMap<String, Rule>>>,
    default_priority: Priority,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Priority [`test_rule`](Self::test_rule) starts accumulating from.
    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    // A panicked writer leaves the map consistent (every write is a single
    // insert or remove), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Rule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Rule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Admin CRUD ──────────────────────────────────────────────────

    /// Validate and add a rule with a fresh UUID, positioned after every
    /// existing rule. At `i64::MAX` the position saturates and the new rule
    /// still sorts last through insertion order.
    pub fn create(&self, new: NewRule) -> Result<Rule> {
        let mut rules = self.write();
        let position = rules
            .values()
            .map(Rule::position)
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let record = RuleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            condition_type: new.condition_type,
            condition_value: new.condition_value,
            action_type: new.action_type,
            action_value: new.action_value,
            is_active: new.is_active,
            position,
        };
        check(&record)?;

        let rule = Rule::from(record);
        info!(rule_id = %rule.id(), position, "created rule");
        rules.insert(rule.id().to_string(), rule.clone());
        Ok(rule)
    }

    pub fn get(&self, id: &str) -> Option<Rule> {
        self.read().get(id).cloned()
    }

    /// Apply a partial update. The merged rule must pass validation.
    pub fn update(&self, id: &str, update: RuleUpdate) -> Result<Rule> {
        let mut rules = self.write();
        let current = rules
            .get(id)
            .ok_or_else(|| RuleStoreError::NotFound(id.to_string()))?;

        let mut record = current.record().clone();
        update.apply(&mut record);
        record.id = id.to_string();
        check(&record)?;

        let rule = Rule::from(record);
        info!(rule_id = %id, "updated rule");
        rules.insert(id.to_string(), rule.clone());
        Ok(rule)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        match self.remove(id) {
            Some(_) => Ok(()),
            None => Err(RuleStoreError::NotFound(id.to_string())),
        }
    }

    /// Assign positions 1..n in the order given. Unknown ids are ignored;
    /// unlisted rules keep their positions. Returns the new snapshot.
    pub fn reorder<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Rule> {
        {
            let mut rules = self.write();
            for (index, id) in ids.iter().enumerate() {
                let id = id.as_ref();
                let Some(rule) = rules.get(id) else {
                    debug!(rule_id = %id, "reorder skipped unknown rule");
                    continue;
                };
                let mut record = rule.record().clone();
                record.position = index as i64 + 1;
                rules.insert(id.to_string(), Rule::from(record));
            }
        }
        info!(count = ids.len(), "reordered rules");
        self.snapshot()
    }

    // ── Loader hooks ────────────────────────────────────────────────

    /// Insert or replace a rule as-is, without validation.
    pub fn upsert(&self, rule: Rule) {
        self.write().insert(rule.id().to_string(), rule);
    }

    pub fn remove(&self, id: &str) -> Option<Rule> {
        let removed = self.write().shift_remove(id);
        if removed.is_some() {
            info!(rule_id = %id, "removed rule");
        }
        removed
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// All rules sorted by position; equal positions keep insertion order.
    pub fn snapshot(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self.read().values().cloned().collect();
        rules.sort_by_key(Rule::position);
        rules
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate `input` against a snapshot of the store.
    pub fn evaluate(
        &self,
        input: &EvaluationInput,
        options: &EvaluationOptions,
    ) -> std::result::Result<EvaluationResult, InputError> {
        evaluator::evaluate(input, &self.snapshot(), options)
    }

    /// Preview rules against a sample post.
    ///
    /// With `rule_id`, only that rule is evaluated, active or not. Without
    /// it, every active rule is. All tested rules are traced and their
    /// actions folded into one priority.
    pub fn test_rule(
        &self,
        input: &EvaluationInput,
        rule_id: Option<&str>,
    ) -> Result<RuleTestReport> {
        // One snapshot serves both the existence check and the evaluation.
        let rules = self.snapshot();
        let options = match rule_id {
            Some(id) => {
                if !rules.iter().any(|r| r.id() == id) {
                    return Err(RuleStoreError::NotFound(id.to_string()));
                }
                EvaluationOptions::targeting(id)
            }
            None => EvaluationOptions::default(),
        }
        .collect_all();

        let result = evaluator::evaluate(input, &rules, &options)?;
        let priority = accumulate_priority(&result, self.default_priority);
        Ok(RuleTestReport { result, priority })
    }
}

fn check(record: &RuleRecord) -> Result<()> {
    let validation = validate_rule(record);
    if validation.valid {
        Ok(())
    } else {
        Err(RuleStoreError::Invalid(validation))
    }
}
