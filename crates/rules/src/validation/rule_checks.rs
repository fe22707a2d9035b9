//! Record and document checks: field limits, type names, operands.

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;
use crate::schema::*;

pub(super) const MAX_NAME_LEN: usize = 100;
pub(super) const MAX_DESCRIPTION_LEN: usize = 500;
pub(super) const MIN_KEYWORD_LEN: usize = 3;

// ── Fields ──────────────────────────────────────────────────────────

pub(super) fn validate_fields(record: &RuleRecord, result: &mut ValidationResult) {
    if record.id.trim().is_empty() {
        result.error("id", "id must not be empty");
    }

    let name_len = record.name.trim().chars().count();
    if name_len == 0 {
        result.error("name", "name must not be empty");
    } else if name_len > MAX_NAME_LEN {
        result.error(
            "name",
            format!("name must be at most {MAX_NAME_LEN} characters, got {name_len}"),
        );
    }

    if let Some(description) = &record.description {
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            result.error(
                "description",
                format!("description must be at most {MAX_DESCRIPTION_LEN} characters, got {len}"),
            );
        }
    }

    if record.position < 0 {
        result.error(
            "position",
            format!("position must be 0 or greater, got {}", record.position),
        );
    }
}

// ── Condition ───────────────────────────────────────────────────────

pub(super) fn validate_condition(record: &RuleRecord, result: &mut ValidationResult) {
    let name = record.condition_type.as_str();
    let Some((kind, legacy)) = ConditionKind::resolve(name) else {
        unknown_type(
            "conditionType",
            "condition",
            name,
            ConditionKind::NAMES,
            result,
        );
        return;
    };

    if legacy {
        result.warn(
            "conditionType",
            format!("'{name}' is a legacy condition type; use '{kind}'"),
        );
    }

    match Condition::parse(name, &record.condition_value) {
        Ok(Condition::KeywordInTitle(keywords))
        | Ok(Condition::KeywordInBody(keywords))
        | Ok(Condition::KeywordInContent(keywords)) => {
            for keyword in keywords.as_slice() {
                if keyword.chars().count() < MIN_KEYWORD_LEN {
                    result.warn(
                        "conditionValue",
                        format!(
                            "keyword '{keyword}' is shorter than {MIN_KEYWORD_LEN} characters and may match too broadly"
                        ),
                    );
                }
            }
        }
        Ok(_) => {}
        Err(ConditionError::InvalidOperand { reason, .. }) => {
            result.error(
                "conditionValue",
                format!(
                    "Invalid value '{}' for {kind}: {reason}",
                    record.condition_value
                ),
            );
        }
        Err(e) => result.error("conditionType", e.to_string()),
    }
}

// ── Action ──────────────────────────────────────────────────────────

pub(super) fn validate_action(record: &RuleRecord, result: &mut ValidationResult) {
    let name = record.action_type.as_str();
    let kind = match name.parse::<ActionKind>() {
        Ok(kind) => kind,
        Err(_) => {
            unknown_type("actionType", "action", name, ActionKind::NAMES, result);
            return;
        }
    };

    match Action::parse(name, &record.action_value) {
        Ok(Action::Escalate) if !record.action_value.trim().is_empty() => {
            result.warn("actionValue", "escalate ignores its value");
        }
        Ok(_) => {}
        Err(ActionError::InvalidOperand { reason, .. }) => {
            result.error(
                "actionValue",
                format!("Invalid value '{}' for {kind}: {reason}", record.action_value),
            );
        }
        Err(e) => result.error("actionType", e.to_string()),
    }
}

fn unknown_type(
    path: &str,
    what: &str,
    name: &str,
    candidates: &[&str],
    result: &mut ValidationResult,
) {
    let normalized = name.trim().replace('_', "-");
    match fuzzy_match(&normalized, candidates) {
        Some(s) => result.error_with_suggestion(
            path,
            format!("Unknown {what} type '{name}'"),
            format!("Did you mean '{s}'?"),
        ),
        None => result.error(path, format!("Unknown {what} type '{name}'")),
    }
}

// ── Document header ─────────────────────────────────────────────────

pub(super) fn validate_header(doc: &PriorityRuleDocument, result: &mut ValidationResult) {
    if doc.api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", doc.api_version),
        );
    }

    if doc.kind != PRIORITY_RULE_KIND {
        result.error(
            "kind",
            format!("kind must be '{PRIORITY_RULE_KIND}', got '{}'", doc.kind),
        );
    }

    // Ids double as file stems for hot-reload removal.
    if !doc.metadata.id.is_empty() && !is_kebab_case(&doc.metadata.id) {
        result.warn(
            "metadata.id",
            format!(
                "id should be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                doc.metadata.id
            ),
        );
    }
}
