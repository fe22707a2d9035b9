//! Filesystem rule loader with hot-reload via `notify` watcher.
//!
//! Reads one `PriorityRule` YAML document per file from a rules directory
//! into a [`RuleStore`](crate::store::RuleStore), and optionally watches the
//! directory to upsert or remove rules as files change. Read-only: rule files
//! are never written.

mod core;
mod error;
mod watcher;


pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
