//! Filesystem event handler for the notify watcher (hot-reload).

use std::fs;
use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use crate::store::RuleStore;

use super::core::{is_dotfile, is_yaml, parse_document};

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, store: &RuleStore) {
    for path in &event.paths {
        if !is_yaml(path) || is_dotfile(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any) => reload(path, store),
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                remove_by_path(path, store);
            }
            _ => {}
        }
    }
}

/// Re-parse and upsert. A rename away from this path shows up as a modify
/// event for a file that no longer exists, so that case removes instead.
pub(super) fn reload(path: &Path, store: &RuleStore) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            remove_by_path(path, store);
            return;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file during hot-reload");
            return;
        }
    };

    match parse_document(&contents) {
        Ok(doc) => {
            info!(rule_id = %doc.metadata.id, path = %path.display(), "hot-reloaded rule");
            store.upsert(doc.to_rule());
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to parse rule during hot-reload, keeping previous version"
            );
        }
    }
}

/// Remove the rule whose id equals the file stem.
pub(super) fn remove_by_path(path: &Path, store: &RuleStore) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let removed = store.remove(stem).is_some();
    if removed {
        info!(rule_id = %stem, path = %path.display(), "removed rule after file deletion");
    }
    removed
}
