//! Batch rename execution: plan construction, conflict handling and
//! case-safe application.

use crate::case_rename::{is_case_only_change, safe_case_rename};
use crate::companions::{companion_rename_pairs, find_companion_files};
use crate::file_item::FileItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Decision returned by the conflict callback when a target already
/// exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictDecision {
    /// Skip this file.
    Skip,
    /// Skip this file and everything after it.
    SkipAll,
    /// Replace the existing target.
    Overwrite,
    /// Documented as "add a numeric suffix"; currently treated as
    /// overwrite, with a warning.
    Rename,
    /// Abort the remaining batch. Already-applied renames stay applied.
    Cancel,
}

/// Callback invoked with the target basename when a conflict is found.
pub type ConflictCallback<'a> = dyn FnMut(&str) -> ConflictDecision + 'a;

/// Optional per-item validator run on the target basename just before the
/// rename. Returns a message describing why the name was rejected.
pub type NameValidator<'a> = dyn Fn(&str) -> Result<(), String> + 'a;

/// Plan/result entry for a single rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionItem {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub skip_reason: String,
    pub is_conflict: bool,
    pub conflict_resolved: bool,
}

impl ExecutionItem {
    fn new(old_path: PathBuf, new_path: PathBuf) -> Self {
        Self {
            old_path,
            new_path,
            success: false,
            error_message: String::new(),
            skip_reason: String::new(),
            is_conflict: false,
            conflict_resolved: false,
        }
    }
}

/// Aggregate outcome of a batch rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub items: Vec<ExecutionItem>,
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub conflicts_count: usize,
}

impl ExecutionResult {
    pub fn new(items: Vec<ExecutionItem>) -> Self {
        let success_count = items.iter().filter(|i| i.success).count();
        let error_count = items
            .iter()
            .filter(|i| !i.success && !i.error_message.is_empty())
            .count();
        let skipped_count = items
            .iter()
            .filter(|i| !i.success && !i.skip_reason.is_empty())
            .count();
        let conflicts_count = items.iter().filter(|i| i.is_conflict).count();

        Self {
            items,
            success_count,
            error_count,
            skipped_count,
            conflicts_count,
        }
    }

    /// Alias for `success_count`.
    pub fn renamed_count(&self) -> usize {
        self.success_count
    }

    /// Alias for `error_count`.
    pub fn failed_count(&self) -> usize {
        self.error_count
    }
}

/// Executes rename plans: pairs files with target names, appends
/// companion renames, resolves conflicts through a callback and applies
/// each rename with case-safe handling.
pub struct ExecutionManager {
    companions_enabled: bool,
}

impl Default for ExecutionManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ExecutionManager {
    pub fn new(companions_enabled: bool) -> Self {
        Self { companions_enabled }
    }

    /// Rename `files` to `new_names` (same length, same order).
    ///
    /// Unchanged files are accounted for without touching the filesystem.
    /// When a target exists, `conflict_callback` decides; without one the
    /// conflict is skipped. `validator` can veto individual target names.
    pub fn execute_rename(
        &self,
        files: &[FileItem],
        new_names: &[String],
        mut conflict_callback: Option<&mut ConflictCallback<'_>>,
        validator: Option<&NameValidator<'_>>,
    ) -> ExecutionResult {
        if files.is_empty() || new_names.is_empty() {
            return ExecutionResult::new(Vec::new());
        }

        let plan = self.build_execution_plan(files, new_names);

        let mut results = Vec::with_capacity(plan.len());
        let mut skip_all = false;
        let mut cancelled = false;
        let mut iter = plan.into_iter();

        while let Some(mut item) = iter.next() {
            // Unchanged entries were settled during planning.
            if item.success {
                results.push(item);
                continue;
            }

            if skip_all {
                item.skip_reason = "skip_all".into();
                results.push(item);
                continue;
            }

            if let Some(validator) = validator {
                if let Err(error) = validator(&basename(&item.new_path)) {
                    item.error_message = error;
                    results.push(item);
                    continue;
                }
            }

            let case_only = is_case_only_change(
                &basename(&item.old_path),
                &basename(&item.new_path),
            );

            // A case-only target "exists" on case-insensitive filesystems
            // because it is the same file; that is not a conflict.
            if item.new_path.exists() && !case_only {
                item.is_conflict = true;
                let decision = match conflict_callback.as_mut() {
                    Some(callback) => callback(&basename(&item.new_path)),
                    None => ConflictDecision::Skip,
                };

                match decision {
                    ConflictDecision::Skip => {
                        item.skip_reason = "conflict_skipped".into();
                        results.push(item);
                        continue;
                    },
                    ConflictDecision::SkipAll => {
                        skip_all = true;
                        item.skip_reason = "conflict_skip_all".into();
                        results.push(item);
                        continue;
                    },
                    ConflictDecision::Overwrite => {
                        item.conflict_resolved = true;
                    },
                    ConflictDecision::Rename => {
                        tracing::warn!(
                            "rename-with-suffix is not implemented; overwriting {}",
                            item.new_path.display()
                        );
                        item.conflict_resolved = true;
                    },
                    ConflictDecision::Cancel => {
                        results.push(item);
                        cancelled = true;
                        break;
                    },
                }
            }

            match self.execute_single_rename(&item, case_only) {
                Ok(()) => item.success = true,
                Err(e) => {
                    item.error_message = e.to_string();
                    tracing::error!("rename failed for {}: {e}", item.old_path.display());
                },
            }
            results.push(item);
        }

        if cancelled {
            // Remaining items are reported untouched: not successful, not
            // skipped.
            results.extend(iter);
        }

        ExecutionResult::new(results)
    }

    /// Pair sources with targets. Files whose name does not change are
    /// marked successful up front so counts stay truthful without a
    /// filesystem call. Companion renames are appended after the
    /// primaries, per primary in input order.
    fn build_execution_plan(&self, files: &[FileItem], new_names: &[String]) -> Vec<ExecutionItem> {
        let mut items = Vec::with_capacity(files.len());
        let mut unchanged = 0usize;

        for (file, new_name) in files.iter().zip(new_names.iter()) {
            let new_path = file.directory().join(new_name);
            let mut item = ExecutionItem::new(file.full_path.clone(), new_path);

            if &file.filename == new_name {
                item.success = true;
                item.skip_reason = "unchanged".into();
                unchanged += 1;
            }

            items.push(item);
        }

        if unchanged > 0 {
            tracing::info!(
                "{unchanged} files already have correct names ({} to rename)",
                items.len() - unchanged
            );
        }

        if self.companions_enabled {
            let companion_items = self.build_companion_plan(files, new_names);
            if !companion_items.is_empty() {
                tracing::info!("added {} companion file renames", companion_items.len());
            }
            items.extend(companion_items);
        }

        items
    }

    /// Companion renames for each primary whose name changes. Folder
    /// listings are read once per directory.
    fn build_companion_plan(&self, files: &[FileItem], new_names: &[String]) -> Vec<ExecutionItem> {
        let mut listings: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        let mut companion_items = Vec::new();

        for (file, new_name) in files.iter().zip(new_names.iter()) {
            if &file.filename == new_name {
                continue;
            }

            let folder = file.directory();
            let folder_files = listings
                .entry(folder.clone())
                .or_insert_with(|| list_files(&folder));

            let companions = find_companion_files(&file.full_path, folder_files);
            if companions.is_empty() {
                continue;
            }

            let new_path = folder.join(new_name);
            for (old_companion, new_companion) in
                companion_rename_pairs(&file.full_path, &new_path, &companions)
            {
                if old_companion == new_companion {
                    continue;
                }
                tracing::debug!(
                    "companion rename: {} -> {}",
                    basename(&old_companion),
                    basename(&new_companion)
                );
                companion_items.push(ExecutionItem::new(old_companion, new_companion));
            }
        }

        companion_items
    }

    fn execute_single_rename(&self, item: &ExecutionItem, case_only: bool) -> anyhow::Result<()> {
        // Same name and same path is a no-op, not an error.
        if item.old_path == item.new_path {
            tracing::debug!("skipping unchanged file: {}", basename(&item.old_path));
            return Ok(());
        }

        if case_only {
            safe_case_rename(&item.old_path, &item.new_path)
        } else {
            fs::rename(&item.old_path, &item.new_path).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to rename {} -> {}: {e}",
                    item.old_path.display(),
                    item.new_path.display()
                )
            })
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn list_files(folder: &Path) -> Vec<PathBuf> {
    match fs::read_dir(folder) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect(),
        Err(_) => Vec::new(),
    }
}
