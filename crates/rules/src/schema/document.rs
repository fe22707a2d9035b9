//! YAML rule document: one `PriorityRule` per file.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Rule, RuleMetadata, RuleRecord};

/// The only document kind this crate loads.
pub const PRIORITY_RULE_KIND: &str = "PriorityRule";

/// Top-level `PriorityRule` YAML document.
///
/// ```yaml
/// apiVersion: v1
/// kind: PriorityRule
/// metadata:
///   id: first-time-poster
///   name: First-time poster
/// spec:
///   position: 1
///   condition: { type: author-post-count-below, value: 1 }
///   action: { type: set-priority, value: P1 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriorityRuleDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: RuleMetadata,
    pub spec: PriorityRuleSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriorityRuleSpec {
    #[serde(default)]
    pub position: i64,
    pub condition: OperandSpec,
    pub action: OperandSpec,
}

/// A `{ type, value }` pair. `value` accepts any YAML scalar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OperandSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Str(s)) => s,
        Some(Scalar::Int(n)) => n.to_string(),
        Some(Scalar::Float(n)) => n.to_string(),
        Some(Scalar::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

impl PriorityRuleDocument {
    /// Flatten into the store shape.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            id: self.metadata.id.clone(),
            name: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
            condition_type: self.spec.condition.kind.clone(),
            condition_value: self.spec.condition.value.clone(),
            action_type: self.spec.action.kind.clone(),
            action_value: self.spec.action.value.clone(),
            is_active: self.metadata.enabled,
            position: self.spec.position,
        }
    }

    pub fn to_rule(&self) -> Rule {
        Rule::from(self.to_record())
    }

    /// Wrap a record as a document.
    pub fn from_record(record: &RuleRecord) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: PRIORITY_RULE_KIND.to_string(),
            metadata: RuleMetadata {
                id: record.id.clone(),
                name: record.name.clone(),
                description: record.description.clone(),
                tags: None,
                enabled: record.is_active,
            },
            spec: PriorityRuleSpec {
                position: record.position,
                condition: OperandSpec {
                    kind: record.condition_type.clone(),
                    value: record.condition_value.clone(),
                },
                action: OperandSpec {
                    kind: record.action_type.clone(),
                    value: record.action_value.clone(),
                },
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
