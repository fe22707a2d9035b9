//! The parsed rule the evaluator consumes.

use serde::{Deserialize, Serialize};

use super::{Action, ActionError, Condition, ConditionError, RuleRecord};

/// An immutable, parsed priority rule.
///
/// Operands are parsed once, when the rule is built from its [`RuleRecord`].
/// Building never fails: a bad condition or action is kept as an `Err` so the
/// evaluator can trace it and move on. Serializes back to the original record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleRecord", into = "RuleRecord")]
pub struct Rule {
    record: RuleRecord,
    condition: Result<Condition, ConditionError>,
    action: Result<Action, ActionError>,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn description(&self) -> Option<&str> {
        self.record.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.record.is_active
    }

    pub fn position(&self) -> i64 {
        self.record.position
    }

    pub fn condition(&self) -> Result<&Condition, &ConditionError> {
        self.condition.as_ref()
    }

    pub fn action(&self) -> Result<&Action, &ActionError> {
        self.action.as_ref()
    }

    /// Raw `actionValue`, reported verbatim in evaluation results.
    pub fn action_value(&self) -> &str {
        &self.record.action_value
    }

    pub fn record(&self) -> &RuleRecord {
        &self.record
    }

    pub fn into_record(self) -> RuleRecord {
        self.record
    }
}

impl From<RuleRecord> for Rule {
    fn from(record: RuleRecord) -> Self {
        let condition = Condition::parse(&record.condition_type, &record.condition_value);
        let action = Action::parse(&record.action_type, &record.action_value);
        Self {
            record,
            condition,
            action,
        }
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        rule.record
    }
}
