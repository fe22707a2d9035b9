//! Typed rule conditions and their operand parsing.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Canonical condition kinds, keyed by their kebab-case wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionKind {
    KeywordInTitle,
    KeywordInBody,
    /// Title and body joined; the legacy `keyword_match` condition.
    KeywordInContent,
    AuthorPostCountBelow,
    SentimentScoreBelow,
    CategoryEquals,
    AgeOver,
}

impl ConditionKind {
    /// Canonical names, used for "did you mean" suggestions.
    pub const NAMES: &'static [&'static str] = &[
        "keyword-in-title",
        "keyword-in-body",
        "keyword-in-content",
        "author-post-count-below",
        "sentiment-score-below",
        "category-equals",
        "age-over",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::KeywordInTitle => "keyword-in-title",
            ConditionKind::KeywordInBody => "keyword-in-body",
            ConditionKind::KeywordInContent => "keyword-in-content",
            ConditionKind::AuthorPostCountBelow => "author-post-count-below",
            ConditionKind::SentimentScoreBelow => "sentiment-score-below",
            ConditionKind::CategoryEquals => "category-equals",
            ConditionKind::AgeOver => "age-over",
        }
    }

    /// Resolve a wire name, returning the kind and whether the name was one of
    /// the legacy aliases (`first_time_poster`, `sla_exceeded`, ...).
    pub fn resolve(name: &str) -> Option<(ConditionKind, bool)> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let resolved = match normalized.as_str() {
            "keyword-in-title" => (ConditionKind::KeywordInTitle, false),
            "keyword-in-body" => (ConditionKind::KeywordInBody, false),
            "keyword-in-content" => (ConditionKind::KeywordInContent, false),
            "author-post-count-below" => (ConditionKind::AuthorPostCountBelow, false),
            "sentiment-score-below" => (ConditionKind::SentimentScoreBelow, false),
            "category-equals" => (ConditionKind::CategoryEquals, false),
            "age-over" => (ConditionKind::AgeOver, false),
            "keyword-match" => (ConditionKind::KeywordInContent, true),
            "first-time-poster" => (ConditionKind::AuthorPostCountBelow, true),
            "sentiment-negative" => (ConditionKind::SentimentScoreBelow, true),
            "category-match" => (ConditionKind::CategoryEquals, true),
            "sla-exceeded" => (ConditionKind::AgeOver, true),
            _ => return None,
        };
        Some(resolved)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConditionKind::resolve(s)
            .map(|(kind, _)| kind)
            .ok_or_else(|| format!("unknown condition type: '{}'", s))
    }
}

// ── Operands ────────────────────────────────────────────────────────

/// Lower-cased keyword list; matches when any keyword is a substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    /// Split a comma-separated operand. Blank entries are dropped.
    pub fn parse(value: &str) -> Option<Self> {
        let keywords: Vec<String> = value
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            None
        } else {
            Some(Keywords(keywords))
        }
    }

    /// First keyword contained in `haystack`, which must already be lower-cased.
    pub fn find_in(&self, haystack: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Parse an age threshold: `<n><unit>` with unit `s|m|h|d|w`, or a bare
/// number of hours.
pub fn parse_duration(value: &str) -> std::result::Result<TimeDelta, String> {
    let v = value.trim().to_ascii_lowercase();
    if v.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number, unit_secs) = match v.char_indices().last() {
        Some((idx, 's')) => (&v[..idx], 1.0),
        Some((idx, 'm')) => (&v[..idx], 60.0),
        Some((idx, 'h')) => (&v[..idx], 3_600.0),
        Some((idx, 'd')) => (&v[..idx], 86_400.0),
        Some((idx, 'w')) => (&v[..idx], 604_800.0),
        _ => (v.as_str(), 3_600.0),
    };

    let n: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a duration", value.trim()))?;
    if !n.is_finite() || n < 0.0 {
        return Err(format!("'{}' must be a non-negative duration", value.trim()));
    }

    let millis = n * unit_secs * 1_000.0;
    if millis > i64::MAX as f64 / 2.0 {
        return Err(format!("'{}' is out of range", value.trim()));
    }
    TimeDelta::try_milliseconds(millis.round() as i64)
        .ok_or_else(|| format!("'{}' is out of range", value.trim()))
}

// ── Condition ───────────────────────────────────────────────────────

/// A parsed rule condition carrying a typed operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    KeywordInTitle(Keywords),
    KeywordInBody(Keywords),
    KeywordInContent(Keywords),
    AuthorPostCountBelow(u64),
    SentimentScoreBelow(f64),
    CategoryEquals(String),
    AgeOver(TimeDelta),
}

/// Why a rule's condition could not be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "kebab-case")]
pub enum ConditionError {
    #[error("unrecognized condition type '{kind}'")]
    Unrecognized { kind: String },

    #[error("invalid operand '{value}' for {kind}: {reason}")]
    InvalidOperand {
        kind: ConditionKind,
        value: String,
        reason: String,
    },
}

impl Condition {
    /// Parse a condition from its string-encoded type and operand.
    pub fn parse(kind: &str, value: &str) -> std::result::Result<Self, ConditionError> {
        let (kind, _) = ConditionKind::resolve(kind).ok_or_else(|| {
            ConditionError::Unrecognized {
                kind: kind.to_string(),
            }
        })?;

        let invalid = |reason: String| ConditionError::InvalidOperand {
            kind,
            value: value.to_string(),
            reason,
        };

        match kind {
            ConditionKind::KeywordInTitle
            | ConditionKind::KeywordInBody
            | ConditionKind::KeywordInContent => {
                let keywords =
                    Keywords::parse(value).ok_or_else(|| invalid("no keywords given".to_string()))?;
                Ok(match kind {
                    ConditionKind::KeywordInTitle => Condition::KeywordInTitle(keywords),
                    ConditionKind::KeywordInBody => Condition::KeywordInBody(keywords),
                    _ => Condition::KeywordInContent(keywords),
                })
            }
            ConditionKind::AuthorPostCountBelow => value
                .trim()
                .parse::<u64>()
                .map(Condition::AuthorPostCountBelow)
                .map_err(|_| invalid("expected a non-negative integer".to_string())),
            ConditionKind::SentimentScoreBelow => match value.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Condition::SentimentScoreBelow(n)),
                _ => Err(invalid("expected a number".to_string())),
            },
            ConditionKind::CategoryEquals => {
                let id = value.trim();
                if id.is_empty() {
                    Err(invalid("category id must not be empty".to_string()))
                } else {
                    Ok(Condition::CategoryEquals(id.to_string()))
                }
            }
            ConditionKind::AgeOver => parse_duration(value)
                .map(Condition::AgeOver)
                .map_err(invalid),
        }
    }

    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::KeywordInTitle(_) => ConditionKind::KeywordInTitle,
            Condition::KeywordInBody(_) => ConditionKind::KeywordInBody,
            Condition::KeywordInContent(_) => ConditionKind::KeywordInContent,
            Condition::AuthorPostCountBelow(_) => ConditionKind::AuthorPostCountBelow,
            Condition::SentimentScoreBelow(_) => ConditionKind::SentimentScoreBelow,
            Condition::CategoryEquals(_) => ConditionKind::CategoryEquals,
            Condition::AgeOver(_) => ConditionKind::AgeOver,
        }
    }
}
