//! Evaluation result and per-rule trace.

use serde::{Deserialize, Serialize};
use triage_core::Priority;

use crate::schema::{ActionError, ActionKind};

/// Outcome recorded for one rule in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceOutcome {
    Matched,
    NotMatched,
    /// Not evaluated: an earlier rule already matched.
    Skipped,
    /// Operand failed to parse; treated as non-matching.
    ConditionInvalid,
    /// Unknown condition type; treated as non-matching.
    ConditionUnrecognized,
}

impl TraceOutcome {
    pub fn is_match(self) -> bool {
        self == TraceOutcome::Matched
    }
}

/// An action as applied by a matching rule. `value` is the rule's
/// `actionValue`, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub kind: ActionKind,
    pub value: String,
}

impl AppliedAction {
    /// Target priority of a `set-priority` action.
    pub fn priority(&self) -> Option<Priority> {
        match self.kind {
            ActionKind::SetPriority => self.value.parse().ok(),
            _ => None,
        }
    }
}

/// Trace entry for one rule considered during an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTrace {
    pub rule_id: String,
    pub rule_name: String,
    pub position: i64,
    pub outcome: TraceOutcome,
    /// Human-readable explanation, e.g. `authorPostCount 0 < 1`.
    pub reason: String,
    /// Set on matched entries whose action parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AppliedAction>,
}

/// Result of evaluating one post against a rule snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// First matching rule in position order.
    pub matched_rule_id: Option<String>,
    /// Set when the matched rule's action is `set-priority`.
    pub resulting_priority: Option<Priority>,
    /// Set when the matched rule's action is anything else.
    pub resulting_action: Option<AppliedAction>,
    /// Why the matched rule produced no priority or action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_error: Option<ActionError>,
    pub evaluated_rules: Vec<RuleTrace>,
}

impl EvaluationResult {
    pub fn is_match(&self) -> bool {
        self.matched_rule_id.is_some()
    }

    /// Every matched rule in position order. Only the first unless the
    /// evaluation ran with `stop_on_first_match = false`.
    pub fn matched_rule_ids(&self) -> Vec<&str> {
        self.matches().map(|t| t.rule_id.as_str()).collect()
    }

    pub fn matches(&self) -> impl Iterator<Item = &RuleTrace> {
        self.evaluated_rules.iter().filter(|t| t.outcome.is_match())
    }

    /// Trace entry for a rule id, if it was considered.
    pub fn trace_for(&self, rule_id: &str) -> Option<&RuleTrace> {
        self.evaluated_rules.iter().find(|t| t.rule_id == rule_id)
    }
}
