use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Moderation queue triage tools.
///
/// Evaluates posts against the priority rules in a rules directory, scores
/// sentiment, and checks rule files before they are deployed.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about = "Priority rules engine for the moderation queue")]
pub struct CliArgs {
    /// Config profile; keys are read as `{PROFILE}_{KEY}` first
    #[arg(long, global = true, env = "TRIAGE_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a post against the active rules and print the result as JSON
    Evaluate(EvaluateArgs),
    /// Preview one rule (active or not), or every active rule, against a post
    TestRule(TestRuleArgs),
    /// Score the sentiment of one or more texts
    Sentiment(SentimentArgs),
    /// Load and validate every rule file in a directory
    Validate(RulesArgs),
    /// Load a rules directory and hot-reload it until Ctrl-C
    Watch(RulesArgs),
}

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Rules directory (default: RULES_DIR from config)
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Post JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub post: String,

    /// Evaluate only this rule, even if it is disabled
    #[arg(long)]
    pub rule_id: Option<String>,

    /// Keep evaluating after the first match
    #[arg(long)]
    pub all_matches: bool,

    /// Reference time for age conditions (RFC 3339, default: now)
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,

    /// Fold every match into one priority (overrides RESOLUTION_POLICY)
    #[arg(long, conflicts_with = "rule_id")]
    pub accumulate: bool,

    /// First match wins (overrides RESOLUTION_POLICY)
    #[arg(long, conflicts_with = "accumulate")]
    pub first_match: bool,
}

#[derive(Args, Debug)]
pub struct TestRuleArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Post JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub post: String,

    /// Rule to preview (default: all active rules)
    #[arg(long)]
    pub rule_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct SentimentArgs {
    /// Text to score; pass several to score a batch
    #[arg(required = true)]
    pub text: Vec<String>,

    /// YAML lexicon replacing the built-in keyword tables
    #[arg(long)]
    pub lexicon: Option<PathBuf>,
}
