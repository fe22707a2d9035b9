//! Priority rule evaluator.
//!
//! Evaluates one post projection against an ordered rule snapshot:
//! - active rules only (or a single targeted rule, active or not)
//! - ascending `position`, ties in snapshot order (stable sort)
//! - first match wins; later rules are traced as skipped unless
//!   `stop_on_first_match` is off
//!
//! Rule-data problems (unknown types, unparsable operands) never fail an
//! evaluation. They are recorded in the trace and the rule is treated as
//! non-matching. Only caller contract violations surface as [`InputError`].

mod conditions;
mod result;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use triage_core::config::EvaluationConfig;
use triage_core::{Priority, ResolutionPolicy};

use crate::input::{EvaluationInput, InputError};
use crate::priority::resolve_priority;
use crate::schema::{Action, ActionKind, ConditionError, Rule};

use conditions::{check, Check, PostView};

pub use result::{AppliedAction, EvaluationResult, RuleTrace, TraceOutcome};

// ── Options ─────────────────────────────────────────────────────────

/// Per-call evaluation options.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOptions {
    /// Restrict evaluation to this rule, ignoring `is_active`.
    pub target_rule_id: Option<String>,
    /// Mark rules after the first match as skipped instead of evaluating them.
    pub stop_on_first_match: bool,
    /// Reference instant for age conditions. Defaults to the current time,
    /// read once per call.
    pub now: Option<DateTime<Utc>>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            target_rule_id: None,
            stop_on_first_match: true,
            now: None,
        }
    }
}

impl EvaluationOptions {
    /// Options for previewing a single rule.
    pub fn targeting(rule_id: impl Into<String>) -> Self {
        Self {
            target_rule_id: Some(rule_id.into()),
            ..Self::default()
        }
    }

    /// Evaluate and trace every rule, even after a match.
    pub fn collect_all(mut self) -> Self {
        self.stop_on_first_match = false;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

// ── Evaluation ──────────────────────────────────────────────────────

/// Evaluate `input` against `rules`.
///
/// Pure: no I/O and no mutation of the inputs. Identical input, rules, and
/// options (including `now`) always produce an identical result.
pub fn evaluate(
    input: &EvaluationInput,
    rules: &[Rule],
    options: &EvaluationOptions,
) -> Result<EvaluationResult, InputError> {
    input.validate()?;

    let now = options.now.unwrap_or_else(Utc::now);
    let post = PostView::new(input, now);

    let mut selected: Vec<&Rule> = match options.target_rule_id.as_deref() {
        Some(target) => rules.iter().filter(|r| r.id() == target).collect(),
        None => rules.iter().filter(|r| r.is_active()).collect(),
    };
    // `sort_by_key` is stable: equal positions keep snapshot order.
    selected.sort_by_key(|r| r.position());

    let mut result = EvaluationResult::default();
    let mut first_match: Option<&Rule> = None;

    for rule in selected {
        if first_match.is_some() && options.stop_on_first_match {
            result.evaluated_rules.push(trace(
                rule,
                TraceOutcome::Skipped,
                "earlier rule matched".to_string(),
            ));
            continue;
        }

        let (outcome, reason) = match rule.condition() {
            Ok(condition) => match check(condition, &post) {
                Check::Matched(reason) => (TraceOutcome::Matched, reason),
                Check::NotMatched(reason) => (TraceOutcome::NotMatched, reason),
            },
            Err(e) => match e {
                ConditionError::Unrecognized { .. } => {
                    (TraceOutcome::ConditionUnrecognized, e.to_string())
                }
                ConditionError::InvalidOperand { .. } => {
                    (TraceOutcome::ConditionInvalid, e.to_string())
                }
            },
        };
        debug!(rule_id = %rule.id(), position = rule.position(), outcome = ?outcome, %reason, "evaluated rule");

        let mut entry = trace(rule, outcome, reason);
        if outcome.is_match() {
            entry.action = applied_action(rule);
            if first_match.is_none() {
                first_match = Some(rule);
            }
        }
        result.evaluated_rules.push(entry);
    }

    if let Some(rule) = first_match {
        apply_action(rule, &mut result);
    }

    Ok(result)
}

fn trace(rule: &Rule, outcome: TraceOutcome, reason: String) -> RuleTrace {
    RuleTrace {
        rule_id: rule.id().to_string(),
        rule_name: rule.name().to_string(),
        position: rule.position(),
        outcome,
        reason,
        action: None,
    }
}

fn applied_action(rule: &Rule) -> Option<AppliedAction> {
    rule.action().ok().map(|action| AppliedAction {
        kind: action.kind(),
        value: rule.action_value().to_string(),
    })
}

/// Write the first match's action into the result.
fn apply_action(rule: &Rule, result: &mut EvaluationResult) {
    result.matched_rule_id = Some(rule.id().to_string());
    match rule.action() {
        Ok(Action::SetPriority(priority)) => result.resulting_priority = Some(*priority),
        Ok(action) => {
            result.resulting_action = Some(AppliedAction {
                kind: action.kind(),
                value: rule.action_value().to_string(),
            })
        }
        Err(e) => {
            debug!(rule_id = %rule.id(), error = %e, "matched rule has no usable action");
            result.action_error = Some(e.clone());
        }
    }
}

// ── Configured evaluator ────────────────────────────────────────────

/// Priority decided for an incoming post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAssignment {
    pub priority: Priority,
    /// True when no rule set a priority and the default applied.
    pub defaulted: bool,
    pub result: EvaluationResult,
}

/// Evaluator with defaults taken from [`EvaluationConfig`]; the post-ingestion
/// entry point.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    config: EvaluationConfig,
}

impl RuleEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Default options for this evaluator.
    pub fn options(&self) -> EvaluationOptions {
        EvaluationOptions {
            stop_on_first_match: self.config.stop_on_first_match,
            ..EvaluationOptions::default()
        }
    }

    pub fn evaluate(
        &self,
        input: &EvaluationInput,
        rules: &[Rule],
    ) -> Result<EvaluationResult, InputError> {
        evaluate(input, rules, &self.options())
    }

    /// Evaluate and resolve a single priority using the configured
    /// [`ResolutionPolicy`]. Accumulation needs every match, so it always
    /// evaluates the full rule list.
    pub fn assign_priority(
        &self,
        input: &EvaluationInput,
        rules: &[Rule],
        now: Option<DateTime<Utc>>,
    ) -> Result<PriorityAssignment, InputError> {
        let mut options = self.options();
        options.now = now;
        if self.config.resolution_policy == ResolutionPolicy::Accumulate {
            options.stop_on_first_match = false;
        }

        let result = evaluate(input, rules, &options)?;
        let defaulted = match self.config.resolution_policy {
            ResolutionPolicy::FirstMatch => result.resulting_priority.is_none(),
            ResolutionPolicy::Accumulate => !result
                .matches()
                .filter_map(|t| t.action.as_ref())
                .any(|a| a.priority().is_some() || a.kind == ActionKind::Escalate),
        };
        let priority = resolve_priority(
            &result,
            self.config.resolution_policy,
            self.config.default_priority,
        );

        debug!(
            priority = %priority,
            defaulted,
            matched = ?result.matched_rule_id,
            "assigned priority"
        );

        Ok(PriorityAssignment {
            priority,
            defaulted,
            result,
        })
    }
}
