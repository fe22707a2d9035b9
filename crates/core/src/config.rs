use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Priority, ResolutionPolicy};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Key lookup used to build a [`Config`]. The process environment in
/// production, a map in tests.
trait Source {
    fn get(&self, key: &str) -> Option<String>;
}

struct ProcessEnv;

impl Source for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<F: Fn(&str) -> Option<String>> Source for F {
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Profiled lookup: tries {PROFILE}_{KEY} first, falls back to {KEY}.
struct Profiled<'a> {
    profile: &'a str,
    source: &'a dyn Source,
}

impl Profiled<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = self.source.get(&prefixed).filter(|s| !s.is_empty()) {
                return Some(v);
            }
        }
        self.source.get(key).filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.opt(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
            Some(v) => {
                tracing::warn!(key, value = %v, "unrecognized boolean, using default");
                default
            }
            None => default,
        }
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T
    where
        T::Err: std::fmt::Display,
    {
        match self.opt(key) {
            Some(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!(key, value = %v, error = %e, "invalid config value, using default");
                default
            }),
            None => default,
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub rules: RulesConfig,
    pub evaluation: EvaluationConfig,
    pub sentiment: SentimentConfig,
    pub log: LogConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TRIAGE_PROFILE`. When set (e.g. `STAGING`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env::var("TRIAGE_PROFILE").unwrap_or_default();
        Self::build(&profile, &ProcessEnv)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::build(profile, &ProcessEnv)
    }

    /// Build config from an arbitrary key lookup instead of the process
    /// environment.
    pub fn from_lookup<F>(profile: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::build(profile, &lookup)
    }

    fn build(profile: &str, source: &dyn Source) -> Self {
        let p = profile.trim().to_uppercase();
        let env = Profiled {
            profile: &p,
            source,
        };
        Self {
            rules: RulesConfig::from_profiled(&env),
            evaluation: EvaluationConfig::from_profiled(&env),
            sentiment: SentimentConfig::from_profiled(&env),
            log: LogConfig::from_profiled(&env),
            profile: p.clone(),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:       dir={}", self.rules.dir.display());
        tracing::info!(
            "  evaluation:  stop_on_first_match={}, policy={}, default_priority={}",
            self.evaluation.stop_on_first_match,
            self.evaluation.resolution_policy,
            self.evaluation.default_priority
        );
        tracing::info!(
            "  sentiment:   lexicon={}",
            self.sentiment
                .lexicon_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        );
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Directory of `PriorityRule` YAML documents.
    pub dir: PathBuf,
}

impl RulesConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        Self {
            dir: PathBuf::from(env.or("RULES_DIR", "data/rules")),
        }
    }
}

// ── Evaluation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub stop_on_first_match: bool,
    pub resolution_policy: ResolutionPolicy,
    /// Applied by callers when no rule sets a priority.
    pub default_priority: Priority,
}

impl EvaluationConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        Self {
            stop_on_first_match: env.bool("STOP_ON_FIRST_MATCH", true),
            resolution_policy: env.parsed("RESOLUTION_POLICY", ResolutionPolicy::FirstMatch),
            default_priority: env.parsed("DEFAULT_PRIORITY", Priority::P3),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            stop_on_first_match: true,
            resolution_policy: ResolutionPolicy::FirstMatch,
            default_priority: Priority::P3,
        }
    }
}

// ── Sentiment ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Optional YAML lexicon replacing the built-in keyword tables.
    pub lexicon_path: Option<PathBuf>,
}

impl SentimentConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        Self {
            lexicon_path: env.opt("SENTIMENT_LEXICON").map(PathBuf::from),
        }
    }
}

// ── Logging ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub filter: String,
}

impl LogConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        Self {
            filter: env.or("TRIAGE_LOG", "warn"),
        }
    }
}
