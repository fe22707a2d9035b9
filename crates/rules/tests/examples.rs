//! Integration tests that load every example rule in `data/rules/examples/`
//! and run realistic posts through them.

use chrono::{Duration, TimeZone, Utc};
use triage_core::config::EvaluationConfig;
use triage_core::{Priority, ResolutionPolicy};
use triage_rules::evaluator::TraceOutcome;
use triage_rules::loader::{LoadStatus, RuleLoader};
use triage_rules::schema::{ActionKind, Condition, ConditionKind, PriorityRuleDocument, Rule};
use triage_rules::validation::{validate_document, validate_rule_set};
use triage_rules::{
    evaluate, score_sentiment, EvaluationInput, EvaluationOptions, RuleEvaluator, RuleStore,
};

/// Resolve the examples directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn examples_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules/examples")
}

fn load_doc(filename: &str) -> PriorityRuleDocument {
    let path = examples_dir().join(filename);
    let yaml = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_yaml::from_str(&yaml)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

fn example_store() -> RuleStore {
    let store = RuleStore::new();
    let loader = RuleLoader::new(examples_dir(), store.clone());
    let results = loader.load_all().unwrap();
    assert!(
        results.iter().all(|r| r.is_loaded()),
        "every example should load: {results:?}"
    );
    store
}

fn rules() -> Vec<Rule> {
    example_store().snapshot()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 17, 18, 0, 0).unwrap()
}

// ── Parsing ─────────────────────────────────────────────────

#[test]
fn parse_first_time_poster_example() {
    let doc = load_doc("first-time-poster.yml");
    assert_eq!(doc.api_version, "v1");
    assert_eq!(doc.kind, "PriorityRule");
    assert_eq!(doc.metadata.id, "first-time-poster");
    assert!(doc.metadata.enabled);
    assert_eq!(doc.metadata.tags.as_deref(), Some(&["onboarding".to_string()][..]));

    let rule = doc.to_rule();
    assert_eq!(rule.position(), 1);
    assert_eq!(rule.condition(), Ok(&Condition::AuthorPostCountBelow(1)));
}

#[test]
fn parse_sla_example_uses_legacy_name() {
    let rule = load_doc("sla-exceeded.yml").to_rule();
    let condition = rule.condition().unwrap();
    assert_eq!(condition.kind(), ConditionKind::AgeOver);
    assert_eq!(condition, &Condition::AgeOver(Duration::hours(2)));
    assert_eq!(rule.action().unwrap().kind(), ActionKind::Escalate);
}

#[test]
fn spam_example_is_disabled() {
    let doc = load_doc("spam-review.yml");
    assert!(!doc.metadata.enabled);
    assert!(!doc.to_rule().is_active());
}

#[test]
fn all_examples_validate() {
    let mut records = Vec::new();
    for entry in std::fs::read_dir(examples_dir()).unwrap() {
        let path = entry.unwrap().path();
        let file = path.file_name().unwrap().to_str().unwrap().to_string();
        let doc = load_doc(&file);
        let result = validate_document(&doc);
        assert!(result.valid, "{file}:\n{}", result.summary());
        assert_eq!(
            path.file_stem().unwrap().to_str().unwrap(),
            doc.metadata.id,
            "file stem must equal id for hot-reload removal"
        );
        records.push(doc.to_record());
    }

    let set = validate_rule_set(&records);
    assert!(set.valid, "{}", set.summary());
    // Only the legacy `sla_exceeded` name is worth a warning.
    assert_eq!(set.warnings.len(), 1, "{}", set.summary());
    assert!(set.warnings[0].path.ends_with("conditionType"));
}

#[test]
fn loader_reports_every_example() {
    let store = RuleStore::new();
    let loader = RuleLoader::new(examples_dir(), store.clone());
    let results = loader.load_all().unwrap();

    assert_eq!(results.len(), 7);
    assert_eq!(store.len(), 7);
    let sla = results
        .iter()
        .find(|r| r.path.ends_with("sla-exceeded.yml"))
        .unwrap();
    match &sla.status {
        LoadStatus::Loaded { warnings, .. } => assert_eq!(warnings.len(), 1),
        other => panic!("unexpected status {other:?}"),
    }
}

// ── Evaluation ──────────────────────────────────────────────

#[test]
fn snapshot_is_position_ordered() {
    let ids: Vec<String> = rules().iter().map(|r| r.id().to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "first-time-poster",
            "negative-sentiment",
            "sla-exceeded",
            "urgent-keywords",
            "bug-report-category",
            "billing-routing",
            "spam-review",
        ]
    );
}

#[test]
fn first_time_poster_wins_first_match() {
    let input = EvaluationInput::new("Need help ASAP", "my account is locked", 0);
    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();

    assert_eq!(result.matched_rule_id.as_deref(), Some("first-time-poster"));
    assert_eq!(result.resulting_priority, Some(Priority::P2));
    assert!(result.resulting_action.is_none());

    let outcomes: Vec<TraceOutcome> = result.evaluated_rules.iter().map(|t| t.outcome).collect();
    assert_eq!(outcomes[0], TraceOutcome::Matched);
    assert!(outcomes[1..].iter().all(|o| *o == TraceOutcome::Skipped));
    assert_eq!(result.evaluated_rules.len(), 6, "disabled rule is not traced");
}

#[test]
fn urgent_keywords_for_regular_author() {
    let input = EvaluationInput::new("Site down", "Please fix this urgently", 12);
    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();

    assert_eq!(result.matched_rule_id.as_deref(), Some("urgent-keywords"));
    assert_eq!(result.resulting_priority, Some(Priority::P1));
    let trace = result.trace_for("urgent-keywords").unwrap();
    assert_eq!(trace.reason, "bodyContent contains 'urgent'");
}

#[test]
fn routing_action_reported_verbatim() {
    let input = EvaluationInput::new("Question", "Where is my invoice?", 4);
    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();

    assert_eq!(result.matched_rule_id.as_deref(), Some("billing-routing"));
    assert!(result.resulting_priority.is_none());
    let action = result.resulting_action.unwrap();
    assert_eq!(action.kind, ActionKind::AutoAssign);
    assert_eq!(action.value, "billing-team");
}

#[test]
fn scored_sentiment_feeds_evaluation() {
    let body = "This update is terrible and the app is broken";
    let sentiment = score_sentiment(body);
    let input = EvaluationInput::new("Latest update", body, 8).with_sentiment(sentiment.score);

    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();
    assert_eq!(result.matched_rule_id.as_deref(), Some("negative-sentiment"));
    assert_eq!(result.resulting_action.unwrap().kind, ActionKind::Escalate);
}

#[test]
fn stale_post_hits_legacy_sla_rule() {
    let input = EvaluationInput::new("Login issue", "cannot sign in", 3)
        .with_created_at(now() - Duration::hours(3));
    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();
    assert_eq!(result.matched_rule_id.as_deref(), Some("sla-exceeded"));
    assert_eq!(
        result.trace_for("sla-exceeded").unwrap().reason,
        "age 3h > 2h"
    );
}

#[test]
fn no_match_leaves_result_empty() {
    let input = EvaluationInput::new("Feature idea", "dark mode would be nice", 40)
        .with_category("11111111-1111-1111-1111-111111111111")
        .with_created_at(now());
    let result = evaluate(&input, &rules(), &EvaluationOptions::default().at(now())).unwrap();
    assert!(!result.is_match());
    assert!(result.resulting_priority.is_none());
    assert!(result
        .evaluated_rules
        .iter()
        .all(|t| t.outcome == TraceOutcome::NotMatched));
}

#[test]
fn accumulate_policy_folds_every_match() {
    let evaluator = RuleEvaluator::new(EvaluationConfig {
        resolution_policy: ResolutionPolicy::Accumulate,
        default_priority: Priority::P4,
        ..EvaluationConfig::default()
    });

    // first-time-poster (P2), negative-sentiment (escalate), bug category (P2)
    let input = EvaluationInput::new("Crash on save", "it crashes every time", 0)
        .with_sentiment(-0.6)
        .with_category("33333333-3333-3333-3333-333333333333");
    let assignment = evaluator
        .assign_priority(&input, &rules(), Some(now()))
        .unwrap();

    assert!(!assignment.defaulted);
    assert_eq!(
        assignment.result.matched_rule_ids(),
        vec!["first-time-poster", "negative-sentiment", "bug-report-category"]
    );
    // P4 -> P2 -> escalate P1 -> P2 is lower, stays P1
    assert_eq!(assignment.priority, Priority::P1);
}

#[test]
fn test_rule_previews_disabled_spam_rule() {
    let store = example_store();
    let input = EvaluationInput::new("FREE MONEY inside", "click here", 5);

    let live = store
        .evaluate(&input, &EvaluationOptions::default().at(now()))
        .unwrap();
    assert!(!live.is_match());

    let report = store.test_rule(&input, Some("spam-review")).unwrap();
    assert_eq!(report.result.evaluated_rules.len(), 1);
    assert_eq!(report.result.matched_rule_id.as_deref(), Some("spam-review"));
    let action = report.result.resulting_action.unwrap();
    assert_eq!(action.kind, ActionKind::FlagForReview);
    assert_eq!(action.value, "possible spam");
    assert_eq!(report.priority, Priority::P3);
}

#[test]
fn admin_edits_change_evaluation() {
    let store = example_store();
    let input = EvaluationInput::new("Need help ASAP", "", 0);

    let ids: Vec<String> = ["urgent-keywords", "first-time-poster"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    store.reorder(&ids);

    let result = store
        .evaluate(&input, &EvaluationOptions::default().at(now()))
        .unwrap();
    assert_eq!(result.matched_rule_id.as_deref(), Some("urgent-keywords"));
    assert_eq!(result.resulting_priority, Some(Priority::P1));
}
