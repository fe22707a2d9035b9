//! Typed rule actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use triage_core::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    SetPriority,
    AssignCategory,
    FlagForReview,
    Escalate,
    AutoAssign,
    Tag,
}

impl ActionKind {
    pub const NAMES: &'static [&'static str] = &[
        "set-priority",
        "assign-category",
        "flag-for-review",
        "escalate",
        "auto-assign",
        "tag",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SetPriority => "set-priority",
            ActionKind::AssignCategory => "assign-category",
            ActionKind::FlagForReview => "flag-for-review",
            ActionKind::Escalate => "escalate",
            ActionKind::AutoAssign => "auto-assign",
            ActionKind::Tag => "tag",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "set-priority" => Ok(ActionKind::SetPriority),
            "assign-category" => Ok(ActionKind::AssignCategory),
            "flag-for-review" => Ok(ActionKind::FlagForReview),
            "escalate" => Ok(ActionKind::Escalate),
            "auto-assign" => Ok(ActionKind::AutoAssign),
            "tag" => Ok(ActionKind::Tag),
            _ => Err(format!("unknown action type: '{}'", s)),
        }
    }
}

/// A parsed rule action carrying a typed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetPriority(Priority),
    AssignCategory(String),
    /// Operand is a free-form reason and may be empty.
    FlagForReview(String),
    Escalate,
    AutoAssign(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "kebab-case")]
pub enum ActionError {
    #[error("unrecognized action type '{kind}'")]
    Unrecognized { kind: String },

    #[error("invalid operand '{value}' for {kind}: {reason}")]
    InvalidOperand {
        kind: ActionKind,
        value: String,
        reason: String,
    },
}

impl Action {
    pub fn parse(kind: &str, value: &str) -> std::result::Result<Self, ActionError> {
        let kind: ActionKind = kind.parse().map_err(|_| ActionError::Unrecognized {
            kind: kind.to_string(),
        })?;

        let required = |build: fn(String) -> Action| {
            let v = value.trim();
            if v.is_empty() {
                Err(ActionError::InvalidOperand {
                    kind,
                    value: value.to_string(),
                    reason: "value must not be empty".to_string(),
                })
            } else {
                Ok(build(v.to_string()))
            }
        };

        match kind {
            ActionKind::SetPriority => value
                .parse::<Priority>()
                .map(Action::SetPriority)
                .map_err(|e| ActionError::InvalidOperand {
                    kind,
                    value: value.to_string(),
                    reason: e.to_string(),
                }),
            ActionKind::AssignCategory => required(Action::AssignCategory),
            ActionKind::FlagForReview => Ok(Action::FlagForReview(value.trim().to_string())),
            ActionKind::Escalate => Ok(Action::Escalate),
            ActionKind::AutoAssign => required(Action::AutoAssign),
            ActionKind::Tag => required(Action::Tag),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SetPriority(_) => ActionKind::SetPriority,
            Action::AssignCategory(_) => ActionKind::AssignCategory,
            Action::FlagForReview(_) => ActionKind::FlagForReview,
            Action::Escalate => ActionKind::Escalate,
            Action::AutoAssign(_) => ActionKind::AutoAssign,
            Action::Tag(_) => ActionKind::Tag,
        }
    }
}
