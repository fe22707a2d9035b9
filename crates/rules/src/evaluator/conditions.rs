//! Condition matchers.

use chrono::{DateTime, TimeDelta, Utc};

use crate::input::EvaluationInput;
use crate::schema::{Condition, Keywords};

/// Lower-cased view of the input, built once per evaluation.
pub(super) struct PostView<'a> {
    input: &'a EvaluationInput,
    title: String,
    body: String,
    now: DateTime<Utc>,
}

impl<'a> PostView<'a> {
    pub(super) fn new(input: &'a EvaluationInput, now: DateTime<Utc>) -> Self {
        Self {
            input,
            title: input.title.to_lowercase(),
            body: input.body_content.to_lowercase(),
            now,
        }
    }
}

/// Condition outcome with a short explanation for the trace.
pub(super) enum Check {
    Matched(String),
    NotMatched(String),
}

impl Check {
    fn from_bool(matched: bool, reason: String) -> Self {
        if matched {
            Check::Matched(reason)
        } else {
            Check::NotMatched(reason)
        }
    }
}

pub(super) fn check(condition: &Condition, post: &PostView<'_>) -> Check {
    match condition {
        Condition::KeywordInTitle(keywords) => keyword_check(keywords, &[("title", &post.title)]),
        Condition::KeywordInBody(keywords) => {
            keyword_check(keywords, &[("bodyContent", &post.body)])
        }
        Condition::KeywordInContent(keywords) => keyword_check(
            keywords,
            &[("title", &post.title), ("bodyContent", &post.body)],
        ),
        Condition::AuthorPostCountBelow(threshold) => {
            let count = post.input.author_post_count;
            Check::from_bool(
                count < *threshold,
                format!(
                    "authorPostCount {} {} {}",
                    count,
                    if count < *threshold { "<" } else { ">=" },
                    threshold
                ),
            )
        }
        Condition::SentimentScoreBelow(threshold) => match post.input.sentiment_score {
            Some(score) => Check::from_bool(
                score < *threshold,
                format!(
                    "sentimentScore {} {} {}",
                    score,
                    if score < *threshold { "<" } else { ">=" },
                    threshold
                ),
            ),
            None => Check::NotMatched("sentimentScore absent".to_string()),
        },
        Condition::CategoryEquals(expected) => match post.input.category_id.as_deref() {
            Some(actual) => Check::from_bool(
                actual == expected,
                format!(
                    "categoryId '{}' {} '{}'",
                    actual,
                    if actual == expected { "==" } else { "!=" },
                    expected
                ),
            ),
            None => Check::NotMatched("categoryId absent".to_string()),
        },
        Condition::AgeOver(threshold) => match post.input.created_at {
            Some(created_at) => {
                let age = post.now - created_at;
                Check::from_bool(
                    age > *threshold,
                    format!(
                        "age {} {} {}",
                        format_delta(age),
                        if age > *threshold { ">" } else { "<=" },
                        format_delta(*threshold)
                    ),
                )
            }
            None => Check::NotMatched("createdAt absent".to_string()),
        },
    }
}

fn keyword_check(keywords: &Keywords, fields: &[(&str, &String)]) -> Check {
    for (field, text) in fields {
        if let Some(hit) = keywords.find_in(text) {
            return Check::Matched(format!("{} contains '{}'", field, hit));
        }
    }
    let names: Vec<&str> = fields.iter().map(|(f, _)| *f).collect();
    Check::NotMatched(format!(
        "{} contains none of [{}]",
        names.join("/"),
        keywords.as_slice().join(", ")
    ))
}

/// Compact `1d 2h 3m 4s` rendering; negative ages keep their sign.
pub(super) fn format_delta(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let mut rest = total.unsigned_abs();
    let mut parts = Vec::new();
    for (unit, secs) in [("d", 86_400u64), ("h", 3_600), ("m", 60), ("s", 1)] {
        if rest >= secs {
            parts.push(format!("{}{}", rest / secs, unit));
            rest %= secs;
        }
    }
    if parts.is_empty() {
        return "0s".to_string();
    }
    format!("{}{}", sign, parts.join(" "))
}
