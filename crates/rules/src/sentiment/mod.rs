//! Keyword-weighted sentiment scoring.
//!
//! Lower-cases the text, sums the weight of every table keyword it contains,
//! clamps to [-1, 1] and labels the result. The tables live in a
//! [`SentimentLexicon`] so they can be tuned (or loaded from YAML) without
//! touching the scoring logic.

mod lexicon;

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use triage_core::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Positive => write!(f, "positive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysis {
    /// Clamped to [-1, 1].
    pub score: f64,
    pub label: SentimentLabel,
    /// Table keywords found in the text, negative table first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

/// Label boundaries. Scores strictly below `negative` are negative, strictly
/// above `positive` are positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelThresholds {
    pub negative: f64,
    pub positive: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            negative: -0.3,
            positive: 0.3,
        }
    }
}

/// Keyword weight tables plus label thresholds.
///
/// YAML shape:
///
/// ```yaml
/// negative: { hate: -0.8, "not working": -0.6 }
/// positive: { thanks: 0.4 }
/// thresholds: { negative: -0.3, positive: 0.3 }   # optional
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentLexicon {
    #[serde(default)]
    pub negative: IndexMap<String, f64>,
    #[serde(default)]
    pub positive: IndexMap<String, f64>,
    #[serde(default)]
    pub thresholds: LabelThresholds,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        let table = |entries: &[(&str, f64)]| {
            entries
                .iter()
                .map(|(k, w)| (k.to_string(), *w))
                .collect::<IndexMap<_, _>>()
        };
        Self {
            negative: table(lexicon::NEGATIVE),
            positive: table(lexicon::POSITIVE),
            thresholds: LabelThresholds::default(),
        }
    }
}

impl SentimentLexicon {
    /// Shared instance of the built-in tables.
    pub fn builtin() -> &'static SentimentLexicon {
        static BUILTIN: OnceLock<SentimentLexicon> = OnceLock::new();
        BUILTIN.get_or_init(SentimentLexicon::default)
    }

    /// Parse a lexicon from YAML. Keywords are lower-cased and must be unique
    /// per table afterwards; weights and thresholds must be finite and
    /// thresholds ordered.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TriageError> {
        let parsed: SentimentLexicon =
            serde_yaml::from_str(yaml).map_err(|e| TriageError::Serialize(e.to_string()))?;
        parsed.normalized()
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, TriageError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    fn normalized(self) -> Result<Self, TriageError> {
        let normalize = |table: IndexMap<String, f64>| -> Result<IndexMap<String, f64>, TriageError> {
            let mut out = IndexMap::with_capacity(table.len());
            for (keyword, weight) in table {
                let keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(TriageError::Serialize("empty sentiment keyword".to_string()));
                }
                if !weight.is_finite() {
                    return Err(TriageError::Serialize(format!(
                        "weight for '{}' is not a finite number",
                        keyword
                    )));
                }
                if out.contains_key(&keyword) {
                    return Err(TriageError::Serialize(format!(
                        "duplicate sentiment keyword '{}'",
                        keyword
                    )));
                }
                out.insert(keyword, weight);
            }
            Ok(out)
        };

        let LabelThresholds { negative, positive } = self.thresholds;
        if !negative.is_finite() || !positive.is_finite() {
            return Err(TriageError::Serialize(format!(
                "thresholds must be finite numbers (negative {}, positive {})",
                negative, positive
            )));
        }
        if negative > positive {
            return Err(TriageError::Serialize(format!(
                "negative threshold {} is above positive threshold {}",
                self.thresholds.negative, self.thresholds.positive
            )));
        }

        Ok(Self {
            negative: normalize(self.negative)?,
            positive: normalize(self.positive)?,
            thresholds: self.thresholds,
        })
    }

    pub fn label_for(&self, score: f64) -> SentimentLabel {
        if score < self.thresholds.negative {
            SentimentLabel::Negative
        } else if score > self.thresholds.positive {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn score(&self, text: &str) -> SentimentAnalysis {
        let lower = text.to_lowercase();
        let mut sum = 0.0;
        let mut matched_keywords = Vec::new();

        for (keyword, weight) in self.negative.iter().chain(self.positive.iter()) {
            if lower.contains(keyword.as_str()) {
                sum += weight;
                matched_keywords.push(keyword.clone());
            }
        }

        if matched_keywords.is_empty() {
            return SentimentAnalysis {
                score: 0.0,
                label: SentimentLabel::Neutral,
                matched_keywords,
            };
        }

        let score = f64::clamp(sum, -1.0, 1.0);
        SentimentAnalysis {
            score,
            label: self.label_for(score),
            matched_keywords,
        }
    }

    pub fn score_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SentimentAnalysis> {
        texts.iter().map(|t| self.score(t.as_ref())).collect()
    }
}

/// Score `text` with the built-in lexicon.
pub fn score_sentiment(text: &str) -> SentimentAnalysis {
    SentimentLexicon::builtin().score(text)
}
