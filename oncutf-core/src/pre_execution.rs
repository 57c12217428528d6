//! Preflight checks run immediately before a batch rename: existence,
//! write permission, lock state and optional hash stability.

use crate::file_item::FileItem;
use crate::services::{ContentHasher, Sha256Hasher};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

/// What kind of problem preflight found with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightIssueKind {
    /// File no longer exists.
    Missing,
    /// File is locked by another process.
    Locked,
    /// No write permission.
    PermissionDenied,
    /// Content hash changed since the preview was generated.
    Modified,
    /// Other access error.
    Inaccessible,
}

impl PreflightIssueKind {
    /// Missing, locked and permission problems block the rename; a
    /// modified file is a warning the caller may choose to ignore.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Missing | Self::Locked | Self::PermissionDenied)
    }
}

/// A single preflight finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreflightIssue {
    pub file: FileItem,
    pub kind: PreflightIssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub technical_details: String,
}

/// Outcome of validating a batch before execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreflightResult {
    /// Files that passed every check.
    pub valid_files: Vec<FileItem>,
    pub issues: Vec<PreflightIssue>,
    pub total_files: usize,
}

impl PreflightResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.kind.is_critical())
    }

    fn files_with(&self, kind: PreflightIssueKind) -> Vec<&FileItem> {
        self.issues
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| &i.file)
            .collect()
    }

    pub fn missing_files(&self) -> Vec<&FileItem> {
        self.files_with(PreflightIssueKind::Missing)
    }

    pub fn locked_files(&self) -> Vec<&FileItem> {
        self.files_with(PreflightIssueKind::Locked)
    }

    pub fn permission_denied_files(&self) -> Vec<&FileItem> {
        self.files_with(PreflightIssueKind::PermissionDenied)
    }

    pub fn modified_files(&self) -> Vec<&FileItem> {
        self.files_with(PreflightIssueKind::Modified)
    }

    /// Human-readable roll-up for dialogs and logs.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            return format!("All {} files passed validation", self.total_files);
        }

        let mut lines = vec![format!("Validation found {} issue(s):", self.issues.len())];
        let missing = self.missing_files().len();
        if missing > 0 {
            lines.push(format!("  - {missing} file(s) missing"));
        }
        let locked = self.locked_files().len();
        if locked > 0 {
            lines.push(format!("  - {locked} file(s) locked"));
        }
        let denied = self.permission_denied_files().len();
        if denied > 0 {
            lines.push(format!("  - {denied} file(s) permission denied"));
        }
        let modified = self.modified_files().len();
        if modified > 0 {
            lines.push(format!("  - {modified} file(s) modified"));
        }
        lines.join("\n")
    }
}

/// Validates files against the live filesystem just before renaming.
pub struct PreExecutionValidator {
    check_hash: bool,
    hasher: Box<dyn ContentHasher>,
}

impl PreExecutionValidator {
    pub fn new(check_hash: bool) -> Self {
        Self {
            check_hash,
            hasher: Box::new(Sha256Hasher),
        }
    }

    /// Use a different hasher for the stability check (must match the
    /// algorithm that produced the stored `hash_value`).
    pub fn with_hasher(mut self, hasher: Box<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Validate every file; files with no findings land in `valid_files`.
    pub fn validate(&self, files: &[FileItem]) -> PreflightResult {
        let mut result = PreflightResult {
            total_files: files.len(),
            ..Default::default()
        };

        for file in files {
            let issues = self.validate_single_file(file);
            if issues.is_empty() {
                result.valid_files.push(file.clone());
            } else {
                result.issues.extend(issues);
            }
        }

        tracing::info!(
            "pre-execution validation: {} valid, {} issues",
            result.valid_files.len(),
            result.issues.len()
        );

        result
    }

    fn validate_single_file(&self, file: &FileItem) -> Vec<PreflightIssue> {
        let mut issues = Vec::new();
        let path = file.full_path.as_path();

        if !path.exists() {
            issues.push(PreflightIssue {
                file: file.clone(),
                kind: PreflightIssueKind::Missing,
                message: format!("File no longer exists: {}", file.filename),
                technical_details: format!("Path: {}", path.display()),
            });
            // No point in further checks.
            return issues;
        }

        if std::fs::metadata(path)
            .map(|m| m.permissions().readonly())
            .unwrap_or(false)
        {
            issues.push(PreflightIssue {
                file: file.clone(),
                kind: PreflightIssueKind::PermissionDenied,
                message: format!("No write permission: {}", file.filename),
                technical_details: format!("Path: {}", path.display()),
            });
        }

        if let Some(issue) = self.check_file_lock(path, file) {
            issues.push(issue);
        }

        if self.check_hash && issues.is_empty() {
            if let Some(issue) = self.check_file_hash(path, file) {
                issues.push(issue);
            }
        }

        issues
    }

    /// Probe for a lock by opening read+write without truncating.
    fn check_file_lock(&self, path: &Path, file: &FileItem) -> Option<PreflightIssue> {
        if !path.is_file() {
            return None;
        }

        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                if cfg!(windows) {
                    // On Windows this usually means the file is open in
                    // another program.
                    Some(PreflightIssue {
                        file: file.clone(),
                        kind: PreflightIssueKind::Locked,
                        message: format!(
                            "File is locked (open in another program): {}",
                            file.filename
                        ),
                        technical_details: e.to_string(),
                    })
                } else {
                    // On Unix the permission check above already reported
                    // this.
                    None
                }
            },
            Err(e) => {
                tracing::warn!("error checking file lock for {}: {e}", path.display());
                Some(PreflightIssue {
                    file: file.clone(),
                    kind: PreflightIssueKind::Inaccessible,
                    message: format!("Cannot access file: {}", file.filename),
                    technical_details: e.to_string(),
                })
            },
        }
    }

    /// Compare the stored hash with a fresh one. Hash errors never fail
    /// validation.
    fn check_file_hash(&self, path: &Path, file: &FileItem) -> Option<PreflightIssue> {
        let stored = file.hash_value.as_deref()?;

        match self.hasher.compute(path) {
            Ok(current) if current != stored => Some(PreflightIssue {
                file: file.clone(),
                kind: PreflightIssueKind::Modified,
                message: format!("File modified since preview: {}", file.filename),
                technical_details: format!(
                    "Expected: {}..., Got: {}...",
                    &stored[..8.min(stored.len())],
                    &current[..8.min(current.len())]
                ),
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("error checking hash for {}: {e}", path.display());
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn existing_file(dir: &TempDir, name: &str, contents: &[u8]) -> FileItem {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        FileItem::from_path(&path)
    }

    #[test]
    fn test_all_valid() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            existing_file(&dir, "a.txt", b"1"),
            existing_file(&dir, "b.txt", b"2"),
        ];

        let result = PreExecutionValidator::new(false).validate(&files);
        assert!(result.is_valid());
        assert_eq!(result.valid_files.len(), 2);
        assert_eq!(result.total_files, 2);
        assert!(result.summary().contains("All 2 files passed"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut file = existing_file(&dir, "a.txt", b"1");
        std::fs::remove_file(&file.full_path).unwrap();
        file.size = 0;

        let result = PreExecutionValidator::new(false).validate(&[file]);
        assert!(!result.is_valid());
        assert!(result.has_critical_issues());
        assert_eq!(result.issues[0].kind, PreflightIssueKind::Missing);
        assert_eq!(result.missing_files().len(), 1);
        assert!(result.summary().contains("missing"));
    }

    #[cfg(unix)]
    #[test]
    fn test_readonly_file_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = existing_file(&dir, "ro.txt", b"1");
        std::fs::set_permissions(
            &file.full_path,
            std::fs::Permissions::from_mode(0o444),
        )
        .unwrap();

        let result = PreExecutionValidator::new(false).validate(&[file.clone()]);
        assert!(result.has_critical_issues());
        assert_eq!(result.permission_denied_files().len(), 1);

        // Restore so the tempdir can be cleaned up.
        std::fs::set_permissions(
            &file.full_path,
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
    }

    #[test]
    fn test_hash_mismatch_is_warning() {
        let dir = TempDir::new().unwrap();
        let mut file = existing_file(&dir, "a.txt", b"original");
        file.hash_value = Some("0".repeat(64));

        let result = PreExecutionValidator::new(true).validate(&[file]);
        assert!(!result.is_valid());
        assert!(!result.has_critical_issues());
        assert_eq!(result.issues[0].kind, PreflightIssueKind::Modified);
        assert_eq!(result.modified_files().len(), 1);
    }

    #[test]
    fn test_matching_hash_passes() {
        let dir = TempDir::new().unwrap();
        let mut file = existing_file(&dir, "a.txt", b"stable");
        file.hash_value = Some(Sha256Hasher.compute(&file.full_path).unwrap());

        let result = PreExecutionValidator::new(true).validate(&[file]);
        assert!(result.is_valid());
    }

    #[test]
    fn test_no_stored_hash_skips_check() {
        let dir = TempDir::new().unwrap();
        let file = existing_file(&dir, "a.txt", b"whatever");

        let result = PreExecutionValidator::new(true).validate(&[file]);
        assert!(result.is_valid());
    }
}
