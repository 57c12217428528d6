//! Case-only rename handling.
//!
//! On case-insensitive filesystems (Windows NTFS, usually macOS APFS) a
//! direct rename from `File.txt` to `FILE.TXT` may be a no-op or fail.
//! These helpers detect that situation and route it through a two-step
//! rename via a temporary name in the same directory.

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// True when the only difference between the names is letter case.
pub fn is_case_only_change(old: &str, new: &str) -> bool {
    old != new && old.to_lowercase() == new.to_lowercase()
}

/// Check if the filesystem at the given path is case-insensitive.
///
/// Probes by creating a lowercase file in a scratch directory and looking
/// it up with an uppercase name. Assumes case-sensitive when the probe
/// cannot run.
pub fn detect_case_insensitive_fs(path: &Path) -> bool {
    let Ok(temp_dir) = TempDir::new_in(path) else {
        return false;
    };

    let lower = temp_dir.path().join("case_probe_a");
    let upper = temp_dir.path().join("case_probe_A");

    if fs::write(&lower, b"probe").is_err() {
        return false;
    }

    fs::metadata(&upper).is_ok()
}

/// Deterministic temporary path for a case-only rename: derived from a
/// digest of the target name, bumped with a counter until a free slot is
/// found. Gives up after 100 attempts.
fn temp_path_for(dir: &Path, target_name: &str) -> Result<PathBuf> {
    let mut hasher = Sha256::new();
    hasher.update(target_name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let tag = &digest[..12.min(digest.len())];

    let mut candidate = dir.join(format!(".oncutf_tmp_{tag}"));
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        if counter > 100 {
            return Err(anyhow!(
                "could not find a free temporary name for case rename in {}",
                dir.display()
            ));
        }
        candidate = dir.join(format!(".oncutf_tmp_{tag}_{counter}"));
    }

    Ok(candidate)
}

/// Rename `src` to `dst`, handling case-only changes safely.
///
/// Case-only changes on a case-insensitive filesystem go through
/// `src -> temp -> dst`; a failure after the first step restores the
/// original name. Everything else is a plain rename.
pub fn safe_case_rename(src: &Path, dst: &Path) -> Result<()> {
    let src_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dst_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !is_case_only_change(&src_name, &dst_name) {
        return fs::rename(src, dst)
            .with_context(|| format!("Failed to rename {} -> {}", src.display(), dst.display()));
    }

    let dir = src.parent().unwrap_or_else(|| Path::new("."));
    if !detect_case_insensitive_fs(dir) {
        // Case-sensitive filesystem: the direct rename is sufficient.
        return fs::rename(src, dst)
            .with_context(|| format!("Failed to rename {} -> {}", src.display(), dst.display()));
    }

    let temp = temp_path_for(dir, &dst_name)?;

    fs::rename(src, &temp).with_context(|| {
        format!(
            "Case rename step 1 failed: {} -> {}",
            src.display(),
            temp.display()
        )
    })?;
    tracing::debug!("case rename step 1: {src_name} -> {}", temp.display());

    if let Err(e) = fs::rename(&temp, dst) {
        // Try to restore the original name before reporting the failure.
        if temp.exists() && !src.exists() {
            if let Err(restore_err) = fs::rename(&temp, src) {
                tracing::error!("failed to restore after case rename failure: {restore_err}");
            } else {
                tracing::info!("restored original file after failed case rename: {src_name}");
            }
        }
        return Err(anyhow!(
            "Case rename step 2 failed: {} -> {}: {e}",
            temp.display(),
            dst.display()
        ));
    }
    tracing::debug!("case rename step 2: {} -> {dst_name}", temp.display());

    Ok(())
}
