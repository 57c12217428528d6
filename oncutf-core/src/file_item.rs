use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single file under consideration for renaming.
///
/// The engine never creates or destroys these; the caller materialises the
/// list (from the file table, a drop, a CLI argument) and updates
/// `full_path` itself after a successful rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    /// Absolute path; owner of the file's identity.
    pub full_path: PathBuf,
    /// Basename including extension.
    pub filename: String,
    /// Extension without the leading dot, lowercased. Empty if none.
    pub extension: String,
    /// Size in bytes at discovery time. Informational only.
    pub size: u64,
    /// Last-modified timestamp at discovery time.
    pub modified: DateTime<Local>,
    /// Whether the user has selected this file for renaming.
    pub checked: bool,
    /// Metadata mapping loaded by the caller, if any.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Precomputed content hash (lowercase hex), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_value: Option<String>,
    /// UI-only color tag. Opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FileItem {
    /// Build a `FileItem` with explicit fields. Useful for tests and for
    /// callers that already hold directory-listing data.
    pub fn new(path: impl Into<PathBuf>, modified: DateTime<Local>) -> Self {
        let full_path = path.into();
        let filename = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = Path::new(&filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            full_path,
            filename,
            extension,
            size: 0,
            modified,
            checked: false,
            metadata: BTreeMap::new(),
            hash_value: None,
            color: None,
        }
    }

    /// Build a `FileItem` from a path, reading size and mtime from the
    /// filesystem. Missing or unreadable files fall back to epoch/zero so
    /// previews can still be generated for stale lists.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let full_path: PathBuf = path.into();
        let (size, modified) = match std::fs::metadata(&full_path) {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .ok()
                    .map(DateTime::<Local>::from)
                    .unwrap_or_else(epoch);
                (meta.len(), modified)
            },
            Err(_) => (0, epoch()),
        };

        let mut item = Self::new(full_path, modified);
        item.size = size;
        item
    }

    /// Basename without extension.
    pub fn stem(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension as it appears in the filename, with the leading dot and
    /// original case. Empty string if the file has no extension.
    pub fn extension_with_dot(&self) -> String {
        match Path::new(&self.filename).extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => String::new(),
        }
    }

    /// Parent directory of the file.
    pub fn directory(&self) -> PathBuf {
        self.full_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// True when the metadata map holds at least one entry.
    pub fn has_metadata(&self) -> bool {
        !self.metadata.is_empty()
    }
}

fn epoch() -> DateTime<Local> {
    Local.timestamp_opt(0, 0).single().unwrap_or_else(Local::now)
}
