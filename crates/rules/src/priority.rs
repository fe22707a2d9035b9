//! Turning evaluation results into a single queue priority.

use triage_core::{Priority, ResolutionPolicy};

use crate::evaluator::EvaluationResult;
use crate::schema::ActionKind;

/// Fold every match in position order, starting from `default`:
/// `set-priority` keeps the more urgent of current and target,
/// `escalate` bumps one level.
///
/// Only sees the matches that were actually evaluated, so callers that want
/// the full picture evaluate with `stop_on_first_match = false`.
pub fn accumulate_priority(result: &EvaluationResult, default: Priority) -> Priority {
    result
        .matches()
        .filter_map(|t| t.action.as_ref())
        .fold(default, |current, action| match action.kind {
            ActionKind::SetPriority => action
                .priority()
                .map_or(current, |target| current.highest(target)),
            ActionKind::Escalate => current.escalate(),
            _ => current,
        })
}

/// Resolve the post's priority under `policy`.
pub fn resolve_priority(
    result: &EvaluationResult,
    policy: ResolutionPolicy,
    default: Priority,
) -> Priority {
    match policy {
        ResolutionPolicy::FirstMatch => result.resulting_priority.unwrap_or(default),
        ResolutionPolicy::Accumulate => accumulate_priority(result, default),
    }
}
