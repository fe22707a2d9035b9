//! Core [`RuleLoader`] struct: filesystem-backed rule loading with optional hot-reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::schema::{PriorityRuleDocument, PRIORITY_RULE_KIND};
use crate::store::RuleStore;
use crate::validation::validate_document;

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::watcher::handle_fs_event;

/// Filesystem-backed rule loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, parses each
/// as a [`PriorityRuleDocument`] and upserts it into the shared
/// [`RuleStore`], keyed by `metadata.id`.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    store: RuleStore,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf, store: RuleStore) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            store,
            _watcher: None,
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse errors are reported
    /// per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        results.sort_by(|a, b| a.path.cmp(&b.path));

        let loaded = results.iter().filter(|r| r.is_loaded()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(path = %self.rules_dir.display(), loaded, failed, "loaded rules directory");
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // read_dir order is platform dependent; sort so equal positions tie
        // break the same way everywhere.
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {

            if is_dotfile(&path) {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Skipped {
                            reason: "dotfile".to_string(),
                        },
                    });
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_yaml(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path) {
                Ok(doc) => self.insert_document(&path, doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Upsert a parsed document. Validation findings are logged and
    /// returned, but never keep the rule out of the store.
    fn insert_document(&self, path: &Path, doc: PriorityRuleDocument) -> LoadStatus {
        let validation = validate_document(&doc);
        let rule_id = doc.metadata.id.clone();

        if !validation.valid {
            warn!(
                rule_id = %rule_id,
                path = %path.display(),
                errors = validation.errors.len(),
                "rule loaded with validation errors"
            );
        }
        info!(rule_id = %rule_id, path = %path.display(), "loaded rule");

        self.store.upsert(doc.to_rule());

        let warnings = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .chain(
                validation
                    .warnings
                    .iter()
                    .map(|w| format!("{}: {}", w.path, w.message)),
            )
            .collect();
        LoadStatus::Loaded { rule_id, warnings }
    }

    /// Parse a single YAML file into a [`PriorityRuleDocument`].
    pub fn load_file(&self, path: &Path) -> Result<PriorityRuleDocument> {
        let contents = fs::read_to_string(path)?;
        parse_document(&contents)
    }

    /// Start a filesystem watcher with 500ms poll interval.
    ///
    /// On file create/modify the rule is re-parsed and upserted.
    /// On file delete the rule whose id equals the file stem is removed.
    /// Parse errors are logged as warnings; the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let store = self.store.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &store),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher
            .configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self._watcher.is_some()
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Store this loader writes into.
    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

/// Parse and structurally check a rule document.
pub(super) fn parse_document(contents: &str) -> Result<PriorityRuleDocument> {
    let doc: PriorityRuleDocument = serde_yaml::from_str(contents)?;

    if doc.kind != PRIORITY_RULE_KIND {
        return Err(RuleError::Validation(format!(
            "unsupported kind '{}' (expected '{}')",
            doc.kind, PRIORITY_RULE_KIND
        )));
    }
    if doc.metadata.id.trim().is_empty() {
        return Err(RuleError::Validation(
            "rule metadata.id must not be empty".to_string(),
        ));
    }

    Ok(doc)
}

pub(super) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

pub(super) fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
