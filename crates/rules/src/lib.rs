//! Priority rules engine for the moderation queue.
//!
//! This crate provides:
//! - Rule schema: flat `RuleRecord`, parsed `Rule`, YAML `PriorityRuleDocument`
//! - A pure evaluator that checks one post against an ordered rule snapshot
//! - A keyword-weighted sentiment scorer
//! - An in-memory rule store with admin CRUD, reordering and rule previews
//! - Filesystem loader with hot-reload via `notify` watcher
//! - Validation with "did you mean" suggestions

pub mod evaluator;
pub mod input;
pub mod loader;
pub mod priority;
pub mod schema;
pub mod sentiment;
pub mod store;
pub mod validation;

pub use evaluator::{evaluate, EvaluationOptions, EvaluationResult, RuleEvaluator};
pub use input::{EvaluationInput, InputError};
pub use sentiment::{score_sentiment, SentimentAnalysis, SentimentLabel, SentimentLexicon};
pub use store::RuleStore;
