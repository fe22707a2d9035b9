//! Tests for the rule evaluator.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use triage_core::config::EvaluationConfig;
use triage_core::{Priority, ResolutionPolicy};

use super::*;
use crate::schema::{ActionError, ActionKind, RuleRecord};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn rule(
    id: &str,
    position: i64,
    condition: (&str, &str),
    action: (&str, &str),
) -> Rule {
    Rule::from(RuleRecord {
        id: id.to_string(),
        name: format!("rule {}", id),
        description: None,
        condition_type: condition.0.to_string(),
        condition_value: condition.1.to_string(),
        action_type: action.0.to_string(),
        action_value: action.1.to_string(),
        is_active: true,
        position,
    })
}

fn inactive(r: Rule) -> Rule {
    let mut record = r.into_record();
    record.is_active = false;
    Rule::from(record)
}

fn post() -> EvaluationInput {
    EvaluationInput::new("Refund needed", "I was charged twice for my order", 5)
}

fn opts() -> EvaluationOptions {
    EvaluationOptions::default().at(now())
}

fn outcomes(result: &EvaluationResult) -> Vec<(&str, TraceOutcome)> {
    result
        .evaluated_rules
        .iter()
        .map(|t| (t.rule_id.as_str(), t.outcome))
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn first_time_poster_gets_p1() {
    let input = EvaluationInput::new("Refund needed", "...", 0);
    let rules = vec![rule(
        "first-timer",
        1,
        ("author-post-count-below", "1"),
        ("set-priority", "P1"),
    )];

    let result = evaluate(&input, &rules, &opts()).unwrap();

    assert_eq!(result.resulting_priority, Some(Priority::P1));
    assert_eq!(result.matched_rule_id.as_deref(), Some("first-timer"));
    assert!(result.resulting_action.is_none());
}

#[test]
fn empty_rule_list_yields_no_match() {
    let result = evaluate(&post(), &[], &opts()).unwrap();
    assert!(!result.is_match());
    assert!(result.evaluated_rules.is_empty());
    assert!(result.resulting_priority.is_none());
    assert!(result.resulting_action.is_none());
}

#[test]
fn stop_on_first_match_skips_later_rules() {
    let rules = vec![
        rule("r1", 1, ("keyword-in-title", "outage"), ("set-priority", "P1")),
        rule("r2", 2, ("keyword-in-title", "refund"), ("set-priority", "P2")),
        rule("r3", 3, ("keyword-in-body", "charged"), ("set-priority", "P3")),
    ];

    let result = evaluate(&post(), &rules, &opts()).unwrap();

    assert_eq!(
        outcomes(&result),
        vec![
            ("r1", TraceOutcome::NotMatched),
            ("r2", TraceOutcome::Matched),
            ("r3", TraceOutcome::Skipped),
        ]
    );
    assert_eq!(result.resulting_priority, Some(Priority::P2));
}

#[test]
fn collect_all_evaluates_every_rule_but_first_match_decides() {
    let rules = vec![
        rule("r1", 1, ("keyword-in-title", "outage"), ("set-priority", "P1")),
        rule("r2", 2, ("keyword-in-title", "refund"), ("set-priority", "P2")),
        rule("r3", 3, ("keyword-in-body", "charged"), ("set-priority", "P1")),
    ];

    let result = evaluate(&post(), &rules, &opts().collect_all()).unwrap();

    assert_eq!(
        outcomes(&result),
        vec![
            ("r1", TraceOutcome::NotMatched),
            ("r2", TraceOutcome::Matched),
            ("r3", TraceOutcome::Matched),
        ]
    );
    assert_eq!(result.matched_rule_id.as_deref(), Some("r2"));
    assert_eq!(result.resulting_priority, Some(Priority::P2));
    assert_eq!(result.matched_rule_ids(), vec!["r2", "r3"]);
}

// ── Ordering ────────────────────────────────────────────────────────

#[test]
fn rules_are_evaluated_by_position_not_list_order() {
    let rules = vec![
        rule("late", 10, ("keyword-in-title", "refund"), ("set-priority", "P4")),
        rule("early", 2, ("keyword-in-title", "refund"), ("set-priority", "P1")),
    ];

    let result = evaluate(&post(), &rules, &opts()).unwrap();

    assert_eq!(result.matched_rule_id.as_deref(), Some("early"));
    assert_eq!(
        outcomes(&result),
        vec![("early", TraceOutcome::Matched), ("late", TraceOutcome::Skipped)]
    );
}

#[test]
fn equal_positions_keep_snapshot_order() {
    let rules = vec![
        rule("b", 1, ("keyword-in-title", "refund"), ("set-priority", "P2")),
        rule("a", 1, ("keyword-in-title", "refund"), ("set-priority", "P1")),
    ];

    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert_eq!(result.matched_rule_id.as_deref(), Some("b"));
}

#[test]
fn evaluation_is_idempotent() {
    let rules = vec![
        rule("r1", 3, ("sentiment-score-below", "-0.5"), ("flag-for-review", "angry")),
        rule("r2", 1, ("category-equals", "billing"), ("assign-category", "finance")),
        rule("r3", 2, ("age-over", "2h"), ("escalate", "")),
        rule("r4", 2, ("bogus", "x"), ("set-priority", "P1")),
    ];
    let input = post()
        .with_sentiment(-0.8)
        .with_created_at(now() - TimeDelta::hours(5));

    let first = evaluate(&input, &rules, &opts().collect_all()).unwrap();
    for _ in 0..5 {
        assert_eq!(evaluate(&input, &rules, &opts().collect_all()).unwrap(), first);
    }
}

// ── Active / targeted ───────────────────────────────────────────────

#[test]
fn inactive_rules_never_match() {
    let rules = vec![inactive(rule(
        "off",
        1,
        ("keyword-in-title", "refund"),
        ("set-priority", "P1"),
    ))];

    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert!(!result.is_match());
    assert!(result.evaluated_rules.is_empty(), "inactive rules are not traced");
}

#[test]
fn target_rule_previews_disabled_rule() {
    let rules = vec![
        rule("on", 1, ("keyword-in-title", "refund"), ("set-priority", "P2")),
        inactive(rule("off", 2, ("keyword-in-title", "refund"), ("set-priority", "P1"))),
    ];

    let options = EvaluationOptions::targeting("off").at(now());
    let result = evaluate(&post(), &rules, &options).unwrap();

    assert_eq!(outcomes(&result), vec![("off", TraceOutcome::Matched)]);
    assert_eq!(result.resulting_priority, Some(Priority::P1));
}

#[test]
fn unknown_target_yields_empty_trace() {
    let rules = vec![rule("on", 1, ("keyword-in-title", "refund"), ("set-priority", "P2"))];
    let result = evaluate(&post(), &rules, &EvaluationOptions::targeting("nope")).unwrap();
    assert!(result.evaluated_rules.is_empty());
    assert!(!result.is_match());
}

// ── Conditions ──────────────────────────────────────────────────────

#[test]
fn keyword_matching_is_case_insensitive() {
    let rules = vec![rule("kw", 1, ("keyword-in-body", "CHARGED TWICE"), ("tag", "billing"))];
    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert!(result.is_match());
    assert_eq!(
        result.resulting_action,
        Some(AppliedAction {
            kind: ActionKind::Tag,
            value: "billing".to_string()
        })
    );
}

#[test]
fn keyword_in_title_ignores_body() {
    let rules = vec![rule("kw", 1, ("keyword-in-title", "charged"), ("tag", "x"))];
    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert!(!result.is_match());
}

#[test]
fn legacy_keyword_match_checks_title_and_body() {
    let rules = vec![rule("kw", 1, ("keyword_match", "lawsuit, charged"), ("escalate", ""))];
    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert!(result.is_match());
    assert_eq!(
        result.evaluated_rules[0].reason,
        "bodyContent contains 'charged'"
    );
}

#[test]
fn sentiment_condition_requires_score() {
    let rules = vec![rule("neg", 1, ("sentiment-score-below", "-0.3"), ("set-priority", "P2"))];

    let absent = evaluate(&post(), &rules, &opts()).unwrap();
    assert!(!absent.is_match());
    assert_eq!(absent.evaluated_rules[0].reason, "sentimentScore absent");

    let negative = evaluate(&post().with_sentiment(-0.6), &rules, &opts()).unwrap();
    assert!(negative.is_match());

    let boundary = evaluate(&post().with_sentiment(-0.3), &rules, &opts()).unwrap();
    assert!(!boundary.is_match(), "comparison is strict");
}

#[test]
fn category_condition() {
    let rules = vec![rule("cat", 1, ("category-equals", "billing"), ("set-priority", "P2"))];

    assert!(!evaluate(&post(), &rules, &opts()).unwrap().is_match());
    assert!(evaluate(&post().with_category("billing"), &rules, &opts())
        .unwrap()
        .is_match());
    assert!(!evaluate(&post().with_category("Billing"), &rules, &opts())
        .unwrap()
        .is_match());
}

#[test]
fn age_condition_uses_reference_instant() {
    let rules = vec![rule("sla", 1, ("age-over", "2h"), ("escalate", ""))];

    let old = post().with_created_at(now() - TimeDelta::hours(3));
    let result = evaluate(&old, &rules, &opts()).unwrap();
    assert!(result.is_match());
    assert_eq!(result.evaluated_rules[0].reason, "age 3h > 2h");

    let fresh = post().with_created_at(now() - TimeDelta::minutes(30));
    assert!(!evaluate(&fresh, &rules, &opts()).unwrap().is_match());

    let exactly = post().with_created_at(now() - TimeDelta::hours(2));
    assert!(!evaluate(&exactly, &rules, &opts()).unwrap().is_match());

    assert!(!evaluate(&post(), &rules, &opts()).unwrap().is_match(), "no createdAt");
}

// ── Fail-closed rule data ───────────────────────────────────────────

#[test]
fn malformed_operand_is_traced_and_evaluation_continues() {
    let rules = vec![
        rule("bad", 1, ("author-post-count-below", "abc"), ("set-priority", "P1")),
        rule("good", 2, ("keyword-in-title", "refund"), ("set-priority", "P3")),
    ];

    let result = evaluate(&post(), &rules, &opts()).unwrap();

    assert_eq!(
        outcomes(&result),
        vec![
            ("bad", TraceOutcome::ConditionInvalid),
            ("good", TraceOutcome::Matched),
        ]
    );
    assert_eq!(result.resulting_priority, Some(Priority::P3));
}

#[test]
fn unrecognized_condition_is_traced() {
    let rules = vec![rule("odd", 1, ("moon-phase", "full"), ("set-priority", "P1"))];
    let result = evaluate(&post(), &rules, &opts()).unwrap();
    assert_eq!(outcomes(&result), vec![("odd", TraceOutcome::ConditionUnrecognized)]);
    assert!(!result.is_match());
}

#[test]
fn unusable_action_leaves_result_fields_empty() {
    let rules = vec![
        rule("r1", 1, ("keyword-in-title", "refund"), ("send-email", "ops@example.com")),
        rule("r2", 2, ("keyword-in-title", "refund"), ("set-priority", "P1")),
    ];

    let result = evaluate(&post(), &rules, &opts()).unwrap();

    assert_eq!(result.matched_rule_id.as_deref(), Some("r1"));
    assert!(result.resulting_priority.is_none());
    assert!(result.resulting_action.is_none());
    assert!(matches!(
        result.action_error,
        Some(ActionError::Unrecognized { .. })
    ));
    assert_eq!(result.evaluated_rules[1].outcome, TraceOutcome::Skipped);
}

#[test]
fn out_of_range_sentiment_is_a_caller_error() {
    let rules = vec![rule("neg", 1, ("sentiment-score-below", "0"), ("set-priority", "P2"))];
    let err = evaluate(&post().with_sentiment(-4.0), &rules, &opts()).unwrap_err();
    assert!(matches!(
        err,
        InputError::InvalidField {
            field: "sentimentScore",
            ..
        }
    ));
}

// ── Trace serialization ─────────────────────────────────────────────

#[test]
fn trace_serializes_kebab_case_outcomes() {
    let rules = vec![
        rule("bad", 1, ("age-over", "soon"), ("set-priority", "P1")),
        rule("good", 2, ("keyword-in-title", "refund"), ("set-priority", "P3")),
    ];
    let result = evaluate(&post(), &rules, &opts()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["matchedRuleId"], "good");
    assert_eq!(json["resultingPriority"], "P3");
    assert_eq!(json["evaluatedRules"][0]["outcome"], "condition-invalid");
    assert_eq!(json["evaluatedRules"][1]["action"]["kind"], "set-priority");
}

// ── RuleEvaluator ───────────────────────────────────────────────────

#[test]
fn assign_priority_defaults_when_nothing_matches() {
    let evaluator = RuleEvaluator::default();
    let rules = vec![rule("r", 1, ("keyword-in-title", "outage"), ("set-priority", "P1"))];

    let assignment = evaluator.assign_priority(&post(), &rules, Some(now())).unwrap();

    assert_eq!(assignment.priority, Priority::P3);
    assert!(assignment.defaulted);
}

#[test]
fn assign_priority_accumulates_when_configured() {
    let evaluator = RuleEvaluator::new(EvaluationConfig {
        stop_on_first_match: true,
        resolution_policy: ResolutionPolicy::Accumulate,
        default_priority: Priority::P4,
    });
    let rules = vec![
        rule("set", 1, ("keyword-in-title", "refund"), ("set-priority", "P3")),
        rule("bump", 2, ("keyword-in-body", "charged"), ("escalate", "")),
    ];

    let assignment = evaluator.assign_priority(&post(), &rules, Some(now())).unwrap();

    assert_eq!(assignment.priority, Priority::P2);
    assert!(!assignment.defaulted);
    assert_eq!(assignment.result.matched_rule_ids(), vec!["set", "bump"]);
}

#[test]
fn assign_priority_first_match() {
    let evaluator = RuleEvaluator::default();
    let rules = vec![
        rule("set", 1, ("keyword-in-title", "refund"), ("set-priority", "P4")),
        rule("bump", 2, ("keyword-in-body", "charged"), ("set-priority", "P1")),
    ];

    let assignment = evaluator.assign_priority(&post(), &rules, Some(now())).unwrap();

    assert_eq!(assignment.priority, Priority::P4);
    assert!(!assignment.defaulted);
}
