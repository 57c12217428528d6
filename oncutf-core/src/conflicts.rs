//! Strategy-based conflict resolution with a bounded undo log.
//!
//! Unlike the interactive callback in the execution manager, this resolver
//! decides without prompts: suffix the target, skip, or overwrite with a
//! backup. Every filesystem action lands on the undo stack so the most
//! recent operations can be reversed in-process.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Default capacity of the undo stack.
pub const UNDO_STACK_CAPACITY: usize = 100;

/// How to resolve a target collision without asking the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStrategy {
    /// Append `_<unix_seconds>` to the target stem.
    Timestamp,
    /// Append `_<n>` with the smallest free `n >= 1`.
    Number,
    /// Leave the target alone and skip the operation.
    Skip,
    /// Back up the existing target, then replace it.
    Overwrite,
}

impl std::str::FromStr for ResolveStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timestamp" => Ok(Self::Timestamp),
            "number" => Ok(Self::Number),
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(format!("Invalid conflict strategy: {s}")),
        }
    }
}

/// Filesystem action recorded on the undo stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Rename,
    Copy,
    Move,
}

/// One entry in the undo log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictOperation {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub kind: OperationKind,
    pub timestamp: DateTime<Local>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

/// Outcome classification of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Success,
    Skipped,
    Error,
    Undo,
    UndoError,
    Redo,
    RedoError,
}

/// Result of resolving (or reversing) one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub original_path: PathBuf,
    pub resolved_path: PathBuf,
    pub kind: ResolutionKind,
    pub backup_created: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl ConflictResolution {
    fn error(old: &Path, new: &Path, message: impl Into<String>) -> Self {
        Self {
            original_path: old.to_path_buf(),
            resolved_path: new.to_path_buf(),
            kind: ResolutionKind::Error,
            backup_created: false,
            success: false,
            error_message: message.into(),
        }
    }
}

/// Bounded LIFO of operations with a redo side. Pushing a new operation
/// discards the oldest entry at capacity and clears the redo stack.
#[derive(Debug)]
pub struct UndoStack {
    stack: VecDeque<ConflictOperation>,
    redo_stack: VecDeque<ConflictOperation>,
    capacity: usize,
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, operation: ConflictOperation) {
        if self.stack.len() == self.capacity {
            self.stack.pop_front();
        }
        self.stack.push_back(operation);
        self.redo_stack.clear();
    }

    /// Pop for undo; the entry moves to the redo side.
    pub fn pop(&mut self) -> Option<ConflictOperation> {
        let operation = self.stack.pop_back()?;
        self.redo_stack.push_back(operation.clone());
        Some(operation)
    }

    /// Pop the redo side; the entry moves back onto the undo side without
    /// clearing redo history.
    pub fn pop_redo(&mut self) -> Option<ConflictOperation> {
        let operation = self.redo_stack.pop_back()?;
        if self.stack.len() == self.capacity {
            self.stack.pop_front();
        }
        self.stack.push_back(operation.clone());
        Some(operation)
    }

    pub fn can_undo(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.redo_stack.clear();
    }
}

/// Snapshot of resolver activity for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictStats {
    pub total_operations: usize,
    pub successful_operations: usize,
    pub success_rate: f64,
    pub can_undo: bool,
    pub can_redo: bool,
    pub backup_dir: PathBuf,
}

/// Resolves filename collisions by strategy and records operations for
/// undo. Overwrites first copy the victim into the backup directory as
/// `<unix_seconds>_<basename>`.
pub struct ConflictResolver {
    backup_dir: PathBuf,
    undo_stack: UndoStack,
}

impl ConflictResolver {
    /// Resolver with the default backup directory under the user's home
    /// (`~/.oncutf/backups`).
    pub fn new() -> Self {
        let backup_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".oncutf")
            .join("backups");
        Self::with_backup_dir(backup_dir)
    }

    pub fn with_backup_dir(backup_dir: impl Into<PathBuf>) -> Self {
        let backup_dir = backup_dir.into();
        if let Err(e) = fs::create_dir_all(&backup_dir) {
            tracing::warn!("could not create backup dir {}: {e}", backup_dir.display());
        }
        Self {
            backup_dir,
            undo_stack: UndoStack::new(UNDO_STACK_CAPACITY),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.undo_stack = UndoStack::new(capacity.max(1));
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Rename `old_path` to `new_path`, resolving a collision with
    /// `strategy` when the target already exists.
    pub fn resolve_conflict(
        &mut self,
        old_path: &Path,
        new_path: &Path,
        strategy: ResolveStrategy,
    ) -> ConflictResolution {
        if !old_path.exists() {
            return ConflictResolution::error(old_path, new_path, "Source file does not exist");
        }

        if !new_path.exists() {
            return self.execute_rename(old_path, new_path, None);
        }

        match strategy {
            ResolveStrategy::Timestamp => {
                let resolved = resolve_with_timestamp(new_path);
                self.execute_rename(old_path, &resolved, None)
            },
            ResolveStrategy::Number => {
                let resolved = resolve_with_number(new_path);
                self.execute_rename(old_path, &resolved, None)
            },
            ResolveStrategy::Skip => ConflictResolution {
                original_path: old_path.to_path_buf(),
                resolved_path: new_path.to_path_buf(),
                kind: ResolutionKind::Skipped,
                backup_created: false,
                success: false,
                error_message: String::new(),
            },
            ResolveStrategy::Overwrite => {
                let backup = match self.create_backup(new_path) {
                    Ok(path) => path,
                    Err(e) => {
                        return ConflictResolution::error(
                            old_path,
                            new_path,
                            format!("Failed to create backup: {e}"),
                        )
                    },
                };
                if let Err(e) = fs::remove_file(new_path) {
                    return ConflictResolution::error(
                        old_path,
                        new_path,
                        format!("Failed to replace target: {e}"),
                    );
                }
                let mut resolution = self.execute_rename(old_path, new_path, Some(backup));
                resolution.backup_created = true;
                resolution
            },
        }
    }

    /// Resolve several `(old, new)` operations with one strategy.
    pub fn batch_resolve_conflicts(
        &mut self,
        operations: &[(PathBuf, PathBuf)],
        strategy: ResolveStrategy,
    ) -> Vec<ConflictResolution> {
        operations
            .iter()
            .map(|(old, new)| {
                let result = self.resolve_conflict(old, new, strategy);
                if result.success {
                    tracing::debug!(
                        "resolved: {} -> {}",
                        old.display(),
                        result.resolved_path.display()
                    );
                } else if !result.error_message.is_empty() {
                    tracing::error!("failed: {} -> {}", old.display(), result.error_message);
                }
                result
            })
            .collect()
    }

    /// Reverse the most recent operation: renames go back, overwrites are
    /// restored from their backup.
    pub fn undo_last_operation(&mut self) -> Option<ConflictResolution> {
        let operation = self.undo_stack.pop()?;

        let result = (|| -> std::io::Result<()> {
            if operation.new_path.exists() {
                fs::rename(&operation.new_path, &operation.old_path)?;
            } else if let Some(backup) = &operation.backup_path {
                if backup.exists() {
                    fs::copy(backup, &operation.old_path)?;
                }
            }
            // Restore the overwritten victim, if there was one.
            if let Some(backup) = &operation.backup_path {
                if backup.exists() && !operation.new_path.exists() {
                    fs::copy(backup, &operation.new_path)?;
                }
            }
            Ok(())
        })();

        Some(match result {
            Ok(()) => ConflictResolution {
                original_path: operation.new_path.clone(),
                resolved_path: operation.old_path.clone(),
                kind: ResolutionKind::Undo,
                backup_created: false,
                success: true,
                error_message: String::new(),
            },
            Err(e) => {
                tracing::error!("undo failed: {e}");
                ConflictResolution {
                    original_path: operation.new_path.clone(),
                    resolved_path: operation.old_path.clone(),
                    kind: ResolutionKind::UndoError,
                    backup_created: false,
                    success: false,
                    error_message: e.to_string(),
                }
            },
        })
    }

    /// Repeat the most recently undone operation.
    pub fn redo_last_operation(&mut self) -> Option<ConflictResolution> {
        let operation = self.undo_stack.pop_redo()?;

        Some(match fs::rename(&operation.old_path, &operation.new_path) {
            Ok(()) => ConflictResolution {
                original_path: operation.old_path.clone(),
                resolved_path: operation.new_path.clone(),
                kind: ResolutionKind::Redo,
                backup_created: false,
                success: true,
                error_message: String::new(),
            },
            Err(e) => {
                tracing::error!("redo failed: {e}");
                ConflictResolution {
                    original_path: operation.old_path.clone(),
                    resolved_path: operation.new_path.clone(),
                    kind: ResolutionKind::RedoError,
                    backup_created: false,
                    success: false,
                    error_message: e.to_string(),
                }
            },
        })
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    pub fn stats(&self) -> ConflictStats {
        let total = self.undo_stack.stack.len() + self.undo_stack.redo_stack.len();
        let successful = self
            .undo_stack
            .stack
            .iter()
            .filter(|op| op.success)
            .count();
        ConflictStats {
            total_operations: total,
            successful_operations: successful,
            success_rate: if total > 0 {
                successful as f64 / total as f64 * 100.0
            } else {
                100.0
            },
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            backup_dir: self.backup_dir.clone(),
        }
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        tracing::debug!("conflict history cleared");
    }

    fn execute_rename(
        &mut self,
        old_path: &Path,
        new_path: &Path,
        backup_path: Option<PathBuf>,
    ) -> ConflictResolution {
        let mut operation = ConflictOperation {
            old_path: old_path.to_path_buf(),
            new_path: new_path.to_path_buf(),
            kind: OperationKind::Rename,
            timestamp: Local::now(),
            success: false,
            error_message: String::new(),
            backup_path,
        };

        match fs::rename(old_path, new_path) {
            Ok(()) => {
                operation.success = true;
                self.undo_stack.push(operation);
                ConflictResolution {
                    original_path: old_path.to_path_buf(),
                    resolved_path: new_path.to_path_buf(),
                    kind: ResolutionKind::Success,
                    backup_created: false,
                    success: true,
                    error_message: String::new(),
                }
            },
            Err(e) => {
                tracing::error!("operation failed: {e}");
                ConflictResolution::error(old_path, new_path, e.to_string())
            },
        }
    }

    fn create_backup(&self, path: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.backup_dir)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_path = self
            .backup_dir
            .join(format!("{}_{filename}", Local::now().timestamp()));
        fs::copy(path, &backup_path)?;
        Ok(backup_path)
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `_<unix_seconds>` to the stem.
fn resolve_with_timestamp(path: &Path) -> PathBuf {
    with_stem_suffix(path, &format!("_{}", Local::now().timestamp()))
}

/// Append `_<n>` with the smallest `n >= 1` that does not collide.
fn resolve_with_number(path: &Path) -> PathBuf {
    let mut counter = 1u64;
    loop {
        let candidate = with_stem_suffix(path, &format!("_{counter}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver_in(dir: &TempDir) -> ConflictResolver {
        ConflictResolver::with_backup_dir(dir.path().join("backups"))
    }

    fn op(old: &str, new: &str) -> ConflictOperation {
        ConflictOperation {
            old_path: PathBuf::from(old),
            new_path: PathBuf::from(new),
            kind: OperationKind::Rename,
            timestamp: Local::now(),
            success: true,
            error_message: String::new(),
            backup_path: None,
        }
    }

    #[test]
    fn test_no_conflict_plain_rename() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();

        let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Timestamp);
        assert!(result.success);
        assert_eq!(result.resolved_path, new);
        assert!(new.exists());
        assert!(resolver.can_undo());
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let result = resolver.resolve_conflict(
            &dir.path().join("missing.txt"),
            &dir.path().join("b.txt"),
            ResolveStrategy::Number,
        );
        assert!(!result.success);
        assert_eq!(result.error_message, "Source file does not exist");
    }

    #[test]
    fn test_number_strategy_picks_free_slot() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&new, b"occupied").unwrap();
        std::fs::write(dir.path().join("b_1.txt"), b"occupied too").unwrap();

        let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Number);
        assert!(result.success);
        assert_eq!(result.resolved_path, dir.path().join("b_2.txt"));
        assert!(dir.path().join("b_2.txt").exists());
        // Original target untouched.
        assert_eq!(std::fs::read(&new).unwrap(), b"occupied");
    }

    #[test]
    fn test_timestamp_strategy_appends_suffix() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&new, b"occupied").unwrap();

        let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Timestamp);
        assert!(result.success);
        let name = result
            .resolved_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("b_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_skip_strategy_leaves_everything() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&new, b"occupied").unwrap();

        let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Skip);
        assert!(!result.success);
        assert_eq!(result.kind, ResolutionKind::Skipped);
        assert!(old.exists());
        assert_eq!(std::fs::read(&new).unwrap(), b"occupied");
        assert!(!resolver.can_undo());
    }

    #[test]
    fn test_overwrite_creates_backup() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"incoming").unwrap();
        std::fs::write(&new, b"victim").unwrap();

        let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Overwrite);
        assert!(result.success);
        assert!(result.backup_created);
        assert_eq!(std::fs::read(&new).unwrap(), b"incoming");

        let backups: Vec<_> = std::fs::read_dir(resolver.backup_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(backups.len(), 1);
        let backup_name = backups[0].file_name().to_string_lossy().into_owned();
        assert!(backup_name.ends_with("_b.txt"));
        assert_eq!(std::fs::read(backups[0].path()).unwrap(), b"victim");
    }

    #[test]
    fn test_undo_restores_rename() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();

        resolver.resolve_conflict(&old, &new, ResolveStrategy::Number);
        assert!(new.exists());

        let undo = resolver.undo_last_operation().unwrap();
        assert!(undo.success);
        assert_eq!(undo.kind, ResolutionKind::Undo);
        assert!(old.exists());
        assert!(!new.exists());
        assert!(resolver.can_redo());
    }

    #[test]
    fn test_redo_repeats_rename() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();

        resolver.resolve_conflict(&old, &new, ResolveStrategy::Number);
        resolver.undo_last_operation().unwrap();
        let redo = resolver.redo_last_operation().unwrap();
        assert!(redo.success);
        assert!(new.exists());
        assert!(!old.exists());
    }

    #[test]
    fn test_undo_empty_stack() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        assert!(resolver.undo_last_operation().is_none());
        assert!(resolver.redo_last_operation().is_none());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = UndoStack::new(10);
        stack.push(op("/a", "/b"));
        stack.pop();
        assert!(stack.can_redo());
        stack.push(op("/c", "/d"));
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_capacity_discards_oldest() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.push(op(&format!("/old{i}"), &format!("/new{i}")));
        }
        assert_eq!(stack.len(), 3);
        // The oldest survivor is operation 2.
        let oldest = stack.stack.front().unwrap();
        assert_eq!(oldest.old_path, PathBuf::from("/old2"));
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let old = dir.path().join("a.txt");
        let occupied = dir.path().join("b.txt");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&occupied, b"y").unwrap();

        // A skipped conflict records nothing.
        resolver.resolve_conflict(&old, &occupied, ResolveStrategy::Skip);
        let stats = resolver.stats();
        assert_eq!(stats.total_operations, 0);
        assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);

        resolver.resolve_conflict(&old, &dir.path().join("c.txt"), ResolveStrategy::Number);
        let stats = resolver.stats();
        assert_eq!(stats.total_operations, 1);
        assert!(stats.can_undo);
    }

    #[test]
    fn test_strategy_from_str() {
        use std::str::FromStr;
        assert_eq!(
            ResolveStrategy::from_str("timestamp"),
            Ok(ResolveStrategy::Timestamp)
        );
        assert_eq!(ResolveStrategy::from_str("NUMBER"), Ok(ResolveStrategy::Number));
        assert!(ResolveStrategy::from_str("bogus").is_err());
    }

    #[test]
    fn test_batch_resolution() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver_in(&dir);
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"1").unwrap();
        std::fs::write(&b, b"2").unwrap();

        let operations = vec![
            (a.clone(), dir.path().join("x.txt")),
            (b.clone(), dir.path().join("y.txt")),
        ];
        let results = resolver.batch_resolve_conflicts(&operations, ResolveStrategy::Number);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
    }
}
