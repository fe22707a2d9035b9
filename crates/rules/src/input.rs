//! Post projection the evaluator consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller contract violations: the only errors the evaluator reports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// The minimal post projection the rules engine needs.
///
/// `title`, `body_content` and `author_post_count` are required; conditions
/// on any absent optional field never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawEvaluationInput")]
pub struct EvaluationInput {
    pub title: String,
    pub body_content: String,
    /// Prior posts by the same author; 0 means a first-time poster.
    pub author_post_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EvaluationInput {
    pub fn new(
        title: impl Into<String>,
        body_content: impl Into<String>,
        author_post_count: u64,
    ) -> Self {
        Self {
            title: title.into(),
            body_content: body_content.into(),
            author_post_count,
            sentiment_score: None,
            category_id: None,
            created_at: None,
        }
    }

    pub fn with_sentiment(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Check the invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(score) = self.sentiment_score {
            if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
                return Err(InputError::InvalidField {
                    field: "sentimentScore",
                    reason: format!("{} is outside [-1, 1]", score),
                });
            }
        }
        Ok(())
    }
}

/// Untrusted input as it arrives from a caller: every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvaluationInput {
    pub title: Option<String>,
    #[serde(alias = "body_content")]
    pub body_content: Option<String>,
    #[serde(alias = "author_post_count")]
    pub author_post_count: Option<i64>,
    #[serde(alias = "sentiment_score")]
    pub sentiment_score: Option<f64>,
    #[serde(alias = "category_id")]
    pub category_id: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawEvaluationInput> for EvaluationInput {
    type Error = InputError;

    fn try_from(raw: RawEvaluationInput) -> Result<Self, Self::Error> {
        let title = raw.title.ok_or(InputError::MissingField("title"))?;
        let body_content = raw
            .body_content
            .ok_or(InputError::MissingField("bodyContent"))?;
        let count = raw
            .author_post_count
            .ok_or(InputError::MissingField("authorPostCount"))?;
        let author_post_count = u64::try_from(count).map_err(|_| InputError::InvalidField {
            field: "authorPostCount",
            reason: format!("{} is negative", count),
        })?;

        let input = Self {
            title,
            body_content,
            author_post_count,
            sentiment_score: raw.sentiment_score,
            category_id: raw.category_id.filter(|c| !c.is_empty()),
            created_at: raw.created_at,
        };
        input.validate()?;
        Ok(input)
    }
}
