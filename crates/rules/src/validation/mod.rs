//! Rule validation with structured errors and suggestions.
//!
//! Validates rule records (field limits, condition/action types, operands),
//! whole rule sets (duplicate ids, colliding positions), and raw YAML rule
//! documents. Returns a [`ValidationResult`] with errors (block save) and
//! warnings (advisory).
//!
//! Evaluation never depends on validation: a rule that fails here still
//! evaluates, with its bad parts traced as invalid.

mod rule_checks;

pub mod fuzzy;


use std::collections::{HashMap, HashSet};

use crate::schema::*;
use serde::{Deserialize, Serialize};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path, e.g. `"conditionValue"` or `"rules[2].actionType"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Fold `other` into `self`, prefixing its paths.
    pub(crate) fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        let join = |path: String| {
            if path.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{path}")
            }
        };
        self.valid &= other.valid;
        self.errors.extend(other.errors.into_iter().map(|e| ValidationError {
            path: join(e.path),
            ..e
        }));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| ValidationWarning {
                path: join(w.path),
                ..w
            }));
    }

    /// One line per problem, errors first. Empty when there is nothing to report.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for e in &self.errors {
            let mut line = format!("error: {}: {}", e.path, e.message);
            if let Some(s) = &e.suggestion {
                line.push_str(&format!(" ({s})"));
            }
            lines.push(line);
        }
        for w in &self.warnings {
            lines.push(format!("warning: {}: {}", w.path, w.message));
        }
        lines.join("\n")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a single rule record.
pub fn validate_rule(record: &RuleRecord) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_fields(record, &mut result);
    rule_checks::validate_condition(record, &mut result);
    rule_checks::validate_action(record, &mut result);
    result
}

/// Validate a parsed YAML rule document: header plus the flattened record.
pub fn validate_document(doc: &PriorityRuleDocument) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_header(doc, &mut result);
    let record = validate_rule(&doc.to_record());
    result.valid &= record.valid;
    result.errors.extend(record.errors);
    result.warnings.extend(record.warnings);
    result
}

/// Validate every record plus cross-rule constraints.
///
/// Duplicate ids are errors. Two active rules sharing a position are a
/// warning: evaluation order then falls back to snapshot order.
pub fn validate_rule_set(records: &[RuleRecord]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen_ids = HashSet::new();
    let mut positions: HashMap<i64, Vec<&str>> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        result.absorb(&format!("rules[{i}]"), validate_rule(record));

        if !seen_ids.insert(record.id.as_str()) {
            result.error(
                format!("rules[{i}].id"),
                format!("Duplicate rule id '{}'", record.id),
            );
        }
        if record.is_active {
            positions
                .entry(record.position)
                .or_default()
                .push(record.id.as_str());
        }
    }

    let mut collisions: Vec<_> = positions.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
    collisions.sort_by_key(|(position, _)| *position);
    for (position, ids) in collisions {
        result.warn(
            "position",
            format!(
                "Active rules share position {position}: {}",
                ids.join(", ")
            ),
        );
    }

    result
}

/// Parse raw YAML and validate. Parse failures become a single error.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    match serde_yaml::from_str::<PriorityRuleDocument>(yaml) {
        Ok(doc) => validate_document(&doc),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}
