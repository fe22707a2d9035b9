//! Subcommand implementations.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use triage_core::config::EvaluationConfig;
use triage_core::{Config, ResolutionPolicy};
use triage_rules::loader::{LoadStatus, RuleLoader};
use triage_rules::schema::RuleRecord;
use triage_rules::validation::validate_rule_set;
use triage_rules::{EvaluationInput, EvaluationOptions, RuleEvaluator, RuleStore, SentimentLexicon};

use crate::cli::{EvaluateArgs, RulesArgs, SentimentArgs, TestRuleArgs};

pub fn evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let (store, _) = load_store(config, &args.rules)?;
    let input = read_post(&args.post)?;

    if resolution_policy(config, &args) == ResolutionPolicy::Accumulate {
        let evaluator = RuleEvaluator::new(EvaluationConfig {
            resolution_policy: ResolutionPolicy::Accumulate,
            ..config.evaluation.clone()
        });
        let assignment = evaluator
            .assign_priority(&input, &store.snapshot(), args.now)
            .context("evaluation rejected the post")?;
        return print_json(&assignment);
    }

    let options = EvaluationOptions {
        target_rule_id: args.rule_id,
        stop_on_first_match: config.evaluation.stop_on_first_match && !args.all_matches,
        now: args.now,
    };
    let result = store
        .evaluate(&input, &options)
        .context("evaluation rejected the post")?;
    print_json(&result)
}

/// Flags override the configured policy. Targeting a single rule always
/// reports that rule's first-match result.
fn resolution_policy(config: &Config, args: &EvaluateArgs) -> ResolutionPolicy {
    if args.rule_id.is_some() || args.first_match {
        ResolutionPolicy::FirstMatch
    } else if args.accumulate {
        ResolutionPolicy::Accumulate
    } else {
        config.evaluation.resolution_policy
    }
}

pub fn test_rule(config: &Config, args: TestRuleArgs) -> Result<()> {
    let (store, _) = load_store(config, &args.rules)?;
    let input = read_post(&args.post)?;
    let report = store.test_rule(&input, args.rule_id.as_deref())?;
    print_json(&report)
}

pub fn sentiment(config: &Config, args: SentimentArgs) -> Result<()> {
    let lexicon = match args.lexicon.or_else(|| config.sentiment.lexicon_path.clone()) {
        Some(path) => SentimentLexicon::from_yaml_file(&path)
            .with_context(|| format!("failed to load lexicon {}", path.display()))?,
        None => SentimentLexicon::builtin().clone(),
    };

    let mut analyses = lexicon.score_batch(&args.text);
    if analyses.len() == 1 {
        return print_json(&analyses.remove(0));
    }
    print_json(&analyses)
}

/// Exit with an error when any file fails to parse or any rule fails
/// validation. Warnings are printed but do not fail the run.
pub fn validate(config: &Config, args: RulesArgs) -> Result<()> {
    let (store, results) = load_store(config, &args)?;

    let mut failed = 0;
    for result in &results {
        match &result.status {
            LoadStatus::Loaded { rule_id, warnings } => {
                println!("ok      {} ({})", result.path.display(), rule_id);
                for w in warnings {
                    println!("        {w}");
                }
            }
            LoadStatus::Skipped { reason } => {
                println!("skip    {} ({})", result.path.display(), reason);
            }
            LoadStatus::Failed { error } => {
                failed += 1;
                println!("FAIL    {}: {}", result.path.display(), error);
            }
        }
    }

    let records: Vec<RuleRecord> = store.snapshot().into_iter().map(|r| r.into_record()).collect();
    let validation = validate_rule_set(&records);
    if !validation.summary().is_empty() {
        println!();
        println!("{}", validation.summary());
    }

    println!();
    println!(
        "{} rules, {} errors, {} warnings, {} unreadable files",
        records.len(),
        validation.errors.len(),
        validation.warnings.len(),
        failed
    );

    if failed > 0 || !validation.valid {
        bail!("rule validation failed");
    }
    Ok(())
}

pub async fn watch(config: &Config, args: RulesArgs) -> Result<()> {
    let dir = rules_dir(config, &args);
    let store = RuleStore::new().with_default_priority(config.evaluation.default_priority);
    let mut loader = RuleLoader::new(dir.clone(), store.clone());
    loader
        .load_all()
        .with_context(|| format!("failed to load rules from {}", dir.display()))?;
    loader.watch().context("failed to start rules watcher")?;

    println!(
        "watching {} ({} rules loaded), Ctrl-C to stop",
        dir.display(),
        store.len()
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!(rules = store.len(), "watcher stopped");
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn rules_dir(config: &Config, args: &RulesArgs) -> PathBuf {
    args.rules.clone().unwrap_or_else(|| config.rules.dir.clone())
}

fn load_store(
    config: &Config,
    args: &RulesArgs,
) -> Result<(RuleStore, Vec<triage_rules::loader::LoadResult>)> {
    let dir = rules_dir(config, args);
    if !dir.is_dir() {
        bail!("rules directory {} does not exist", dir.display());
    }

    let store = RuleStore::new().with_default_priority(config.evaluation.default_priority);
    let results = RuleLoader::new(dir.clone(), store.clone())
        .load_all()
        .with_context(|| format!("failed to load rules from {}", dir.display()))?;

    for result in results.iter().filter(|r| r.is_failed()) {
        warn!(path = %result.path.display(), "skipped unreadable rule file");
    }
    Ok((store, results))
}

fn read_post(source: &str) -> Result<EvaluationInput> {
    let json = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read post from stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read post {source}"))?
    };
    serde_json::from_str(&json).context("invalid post JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{CliArgs, Command};

    fn config(policy: &str) -> Config {
        let policy = policy.to_string();
        Config::from_lookup("", move |key| {
            (key == "RESOLUTION_POLICY").then(|| policy.clone())
        })
    }

    fn evaluate_args(flags: &[&str]) -> EvaluateArgs {
        let argv = ["triage", "evaluate"].iter().chain(flags).copied();
        match CliArgs::parse_from(argv).command {
            Command::Evaluate(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn configured_policy_applies_without_flags() {
        let args = evaluate_args(&[]);
        assert_eq!(
            resolution_policy(&config("accumulate"), &args),
            ResolutionPolicy::Accumulate
        );
        assert_eq!(
            resolution_policy(&config("first-match"), &args),
            ResolutionPolicy::FirstMatch
        );
    }

    #[test]
    fn flags_override_configured_policy() {
        assert_eq!(
            resolution_policy(&config("first-match"), &evaluate_args(&["--accumulate"])),
            ResolutionPolicy::Accumulate
        );
        assert_eq!(
            resolution_policy(&config("accumulate"), &evaluate_args(&["--first-match"])),
            ResolutionPolicy::FirstMatch
        );
    }

    #[test]
    fn targeted_rule_uses_first_match() {
        let args = evaluate_args(&["--rule-id", "spam-review"]);
        assert_eq!(
            resolution_policy(&config("accumulate"), &args),
            ResolutionPolicy::FirstMatch
        );
    }
}
