//! Flat, string-typed rule shape exchanged with rule stores.

use serde::{Deserialize, Serialize};

pub(crate) fn default_true() -> bool {
    true
}

/// A rule exactly as an administrator saved it.
///
/// Operands stay string-encoded here; [`Rule`](super::Rule) is the parsed
/// form the evaluator works with. Field names are camelCase on the wire,
/// with snake_case accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "condition_type")]
    pub condition_type: String,
    #[serde(default, alias = "condition_value")]
    pub condition_value: String,
    #[serde(alias = "action_type")]
    pub action_type: String,
    #[serde(default, alias = "action_value")]
    pub action_value: String,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub position: i64,
}
