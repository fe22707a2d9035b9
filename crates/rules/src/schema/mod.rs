//! Rule schema types with serde deserialization.
//!
//! - `RuleRecord`: flat, string-typed shape exchanged with rule stores
//! - `Rule`: parsed form with typed `Condition`/`Action` operands
//! - `PriorityRuleDocument`: one-rule-per-file YAML document

mod action;
mod condition;
mod document;
mod metadata;
mod record;
mod rule;

pub use action::*;
pub use condition::*;
pub use document::*;
pub use metadata::*;
pub use record::RuleRecord;
pub(crate) use record::default_true;
pub use rule::*;
