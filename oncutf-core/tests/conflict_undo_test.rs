//! Conflict strategies and undo/redo semantics.

use oncutf_core::conflicts::{ConflictResolver, ResolveStrategy};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn resolver_in(dir: &TempDir) -> ConflictResolver {
    ConflictResolver::with_backup_dir(dir.path().join("backups"))
}

#[test]
fn undo_restores_original_basename() {
    let dir = TempDir::new().unwrap();
    let mut resolver = resolver_in(&dir);
    let old = dir.path().join("original.txt");
    let new = dir.path().join("renamed.txt");
    fs::write(&old, b"content").unwrap();

    let result = resolver.resolve_conflict(&old, &new, ResolveStrategy::Number);
    assert!(result.success);
    assert!(!old.exists());

    let undo = resolver.undo_last_operation().unwrap();
    assert!(undo.success);
    assert!(old.exists());
    assert!(!new.exists());
    assert_eq!(fs::read(&old).unwrap(), b"content");
}

#[test]
fn new_operation_clears_redo_stack() {
    let dir = TempDir::new().unwrap();
    let mut resolver = resolver_in(&dir);
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::write(&a, b"1").unwrap();

    resolver.resolve_conflict(&a, &b, ResolveStrategy::Number);
    resolver.undo_last_operation().unwrap();
    assert!(resolver.can_redo());

    // A fresh operation invalidates the redo history.
    resolver.resolve_conflict(&a, &c, ResolveStrategy::Number);
    assert!(!resolver.can_redo());
    assert!(resolver.redo_last_operation().is_none());
}

#[test]
fn undo_after_overwrite_restores_both_files() {
    let dir = TempDir::new().unwrap();
    let mut resolver = resolver_in(&dir);
    let source = dir.path().join("source.txt");
    let target = dir.path().join("target.txt");
    fs::write(&source, b"incoming").unwrap();
    fs::write(&target, b"victim").unwrap();

    let result = resolver.resolve_conflict(&source, &target, ResolveStrategy::Overwrite);
    assert!(result.success);
    assert_eq!(fs::read(&target).unwrap(), b"incoming");

    let undo = resolver.undo_last_operation().unwrap();
    assert!(undo.success);
    assert_eq!(fs::read(&source).unwrap(), b"incoming");
    assert_eq!(fs::read(&target).unwrap(), b"victim");
}

#[test]
fn capacity_bound_discards_oldest_entries() {
    let dir = TempDir::new().unwrap();
    let mut resolver =
        ConflictResolver::with_backup_dir(dir.path().join("backups")).with_capacity(3);

    let mut current = dir.path().join("step0.txt");
    fs::write(&current, b"x").unwrap();
    for i in 1..=5 {
        let next = dir.path().join(format!("step{i}.txt"));
        let result = resolver.resolve_conflict(&current, &next, ResolveStrategy::Number);
        assert!(result.success);
        current = next;
    }

    // Only the last three renames are undoable.
    let mut undone = 0;
    while resolver.undo_last_operation().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert!(dir.path().join("step2.txt").exists());
}

#[test]
fn timestamp_and_number_suffixes_preserve_extension() {
    let dir = TempDir::new().unwrap();
    let mut resolver = resolver_in(&dir);
    let old = dir.path().join("clip.mp4");
    let occupied = dir.path().join("target.mp4");
    fs::write(&old, b"a").unwrap();
    fs::write(&occupied, b"b").unwrap();

    let result = resolver.resolve_conflict(&old, &occupied, ResolveStrategy::Number);
    assert!(result.success);
    assert_eq!(result.resolved_path, dir.path().join("target_1.mp4"));

    let old2 = dir.path().join("clip2.mp4");
    fs::write(&old2, b"c").unwrap();
    let result = resolver.resolve_conflict(&old2, &occupied, ResolveStrategy::Timestamp);
    assert!(result.success);
    let name = result
        .resolved_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned());
    assert_eq!(name.as_deref(), Some("mp4"));
}

#[test]
fn batch_resolution_reports_per_operation() {
    let dir = TempDir::new().unwrap();
    let mut resolver = resolver_in(&dir);
    let a = dir.path().join("a.txt");
    fs::write(&a, b"1").unwrap();

    let operations: Vec<(PathBuf, PathBuf)> = vec![
        (a.clone(), dir.path().join("x.txt")),
        (dir.path().join("missing.txt"), dir.path().join("y.txt")),
    ];
    let results = resolver.batch_resolve_conflicts(&operations, ResolveStrategy::Skip);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].error_message, "Source file does not exist");
}
