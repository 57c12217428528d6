//! Execution against a real (temporary) filesystem: conflicts, case-only
//! renames and cancellation.

use oncutf_core::execution::{ConflictDecision, ExecutionManager};
use oncutf_core::file_item::FileItem;
use std::fs;
use tempfile::TempDir;

fn setup(dir: &TempDir, names: &[&str]) -> Vec<FileItem> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, b"data").unwrap();
            FileItem::from_path(&path)
        })
        .collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn listing(dir: &TempDir) -> Vec<String> {
    let mut entries: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    entries
}

#[test]
fn case_only_rename_round_trip() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["File.txt"]);
    let manager = ExecutionManager::new(false);

    let result = manager.execute_rename(&files, &names(&["FILE.TXT"]), None, None);
    assert_eq!(result.success_count, 1);

    let upper = FileItem::from_path(dir.path().join("FILE.TXT"));
    let result = manager.execute_rename(&[upper], &names(&["File.txt"]), None, None);
    assert_eq!(result.success_count, 1);

    let entries = listing(&dir);
    assert_eq!(entries, vec!["File.txt"]);
}

#[test]
fn upper_case_post_transform_scenario() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["report.txt"]);
    let manager = ExecutionManager::new(false);

    let result = manager.execute_rename(&files, &names(&["REPORT.TXT"]), None, None);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.error_count, 0);

    let entries = listing(&dir);
    assert_eq!(entries, vec!["REPORT.TXT"]);
}

#[test]
fn conflict_skip_then_continue() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["a.txt", "b.txt", "taken.txt"]);
    let manager = ExecutionManager::new(false);

    let mut decisions = vec![ConflictDecision::Skip];
    let mut callback = move |_: &str| decisions.pop().unwrap_or(ConflictDecision::Skip);

    let result = manager.execute_rename(
        &files[..2],
        &names(&["taken.txt", "fine.txt"]),
        Some(&mut callback),
        None,
    );
    assert_eq!(result.conflicts_count, 1);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.success_count, 1);
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("fine.txt").exists());
}

#[test]
fn overwrite_replaces_target() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["source.txt", "victim.txt"]);
    fs::write(dir.path().join("source.txt"), b"from-source").unwrap();
    let manager = ExecutionManager::new(false);

    let mut callback = |_: &str| ConflictDecision::Overwrite;
    let result = manager.execute_rename(
        &files[..1],
        &names(&["victim.txt"]),
        Some(&mut callback),
        None,
    );
    assert_eq!(result.success_count, 1);
    assert!(result.items[0].conflict_resolved);
    assert_eq!(fs::read(dir.path().join("victim.txt")).unwrap(), b"from-source");
}

#[test]
fn rename_decision_treated_as_overwrite() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["source.txt", "victim.txt"]);
    let manager = ExecutionManager::new(false);

    let mut callback = |_: &str| ConflictDecision::Rename;
    let result = manager.execute_rename(
        &files[..1],
        &names(&["victim.txt"]),
        Some(&mut callback),
        None,
    );
    assert_eq!(result.success_count, 1);
    assert!(result.items[0].conflict_resolved);
}

#[test]
fn cancel_stops_mid_batch_but_keeps_committed_renames() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["a.txt", "b.txt", "c.txt", "taken.txt"]);
    let manager = ExecutionManager::new(false);

    let mut callback = |_: &str| ConflictDecision::Cancel;
    let result = manager.execute_rename(
        &files[..3],
        &names(&["x.txt", "taken.txt", "z.txt"]),
        Some(&mut callback),
        None,
    );

    // First rename committed before the conflict.
    assert!(dir.path().join("x.txt").exists());
    // The conflicting and the remaining item were not renamed.
    assert!(dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());

    assert_eq!(result.items.len(), 3);
    assert_eq!(result.success_count, 1);
    assert!(!result.items[2].success);
    assert!(result.items[2].skip_reason.is_empty());
    assert!(result.items[2].error_message.is_empty());
}

#[test]
fn callback_receives_target_basename() {
    let dir = TempDir::new().unwrap();
    let files = setup(&dir, &["a.txt", "taken.txt"]);
    let manager = ExecutionManager::new(false);

    let mut seen = Vec::new();
    let mut callback = |name: &str| {
        seen.push(name.to_string());
        ConflictDecision::Skip
    };
    manager.execute_rename(&files[..1], &names(&["taken.txt"]), Some(&mut callback), None);
    assert_eq!(seen, vec!["taken.txt"]);
}

#[test]
fn missing_source_records_error_and_continues() {
    let dir = TempDir::new().unwrap();
    let mut files = setup(&dir, &["gone.txt", "ok.txt"]);
    fs::remove_file(&files[0].full_path).unwrap();
    files[0].size = 0;
    let manager = ExecutionManager::new(false);

    let result = manager.execute_rename(&files, &names(&["x.txt", "y.txt"]), None, None);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.success_count, 1);
    assert!(!result.items[0].error_message.is_empty());
    assert!(dir.path().join("y.txt").exists());
}
