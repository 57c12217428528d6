use crate::file_item::FileItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The grouping over which counter values reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterScope {
    /// Single counter across all files.
    Global,
    /// Reset counter at folder boundaries.
    #[default]
    PerFolder,
    /// Reset counter per extension (case-insensitive).
    PerExtension,
    /// Reset counter per file group (folder groups by default, or a
    /// caller-supplied companion grouping).
    PerFilegroup,
    /// Reset counter per user-provided selection group. Requires a
    /// selection-group provider; behaves like `PerFilegroup` when one is
    /// supplied.
    PerSelection,
}

impl CounterScope {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Global => "Global (all files)",
            Self::PerFolder => "Per Folder",
            Self::PerExtension => "Per Extension",
            Self::PerFilegroup => "Per File Group",
            Self::PerSelection => "Per Selection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Global => "Single counter across all files",
            Self::PerFolder => "Reset counter at folder boundaries",
            Self::PerExtension => "Reset counter for each file extension",
            Self::PerFilegroup => "Reset counter for each file group",
            Self::PerSelection => "Reset counter for each selection group",
        }
    }
}

impl std::fmt::Display for CounterScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Global => "global",
            Self::PerFolder => "per_folder",
            Self::PerExtension => "per_extension",
            Self::PerFilegroup => "per_filegroup",
            Self::PerSelection => "per_selection",
        };
        f.write_str(s)
    }
}

/// A group of files from a common source, used for counter scoping and
/// companion handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileGroup {
    /// The folder (or logical key) this group came from.
    pub source_path: PathBuf,
    /// Files in group order.
    pub files: Vec<FileItem>,
    /// Whether the group was produced by a recursive scan.
    pub recursive: bool,
    /// Free-form annotations, e.g. `group_type = "companion"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl FileGroup {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            files: Vec::new(),
            recursive: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn add_file(&mut self, file: FileItem) {
        if !self.files.iter().any(|f| f.full_path == file.full_path) {
            self.files.push(file);
        }
    }
}

/// Group files by their parent folder, preserving input order within each
/// group and the order in which folders first appear.
pub fn group_files_by_folder(files: &[FileItem]) -> Vec<FileGroup> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut groups: BTreeMap<PathBuf, FileGroup> = BTreeMap::new();

    for file in files {
        let folder = file.directory();
        if !groups.contains_key(&folder) {
            order.push(folder.clone());
            groups.insert(folder.clone(), FileGroup::new(&folder));
        }
        if let Some(group) = groups.get_mut(&folder) {
            group.add_file(file.clone());
        }
    }

    tracing::debug!(
        files = files.len(),
        groups = order.len(),
        "grouped files by folder"
    );

    order
        .into_iter()
        .filter_map(|folder| groups.remove(&folder))
        .collect()
}

/// Default RAW-primary companion pattern map used by
/// [`group_files_by_companion`] when the caller supplies none.
fn default_companion_extensions() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (".cr2", vec![".jpg", ".jpeg"]),
        (".nef", vec![".jpg", ".jpeg"]),
        (".arw", vec![".jpg", ".jpeg"]),
        (".orf", vec![".jpg", ".jpeg"]),
        (".dng", vec![".jpg", ".jpeg"]),
        (".raw", vec![".jpg", ".jpeg"]),
    ]
}

/// Group files that share a stem and folder into companion groups
/// (e.g. RAW+JPG pairs). Files that share a stem without a matching
/// primary/companion extension pair become standalone groups.
pub fn group_files_by_companion(
    files: &[FileItem],
    companion_patterns: Option<&[(&str, Vec<&str>)]>,
) -> Vec<FileGroup> {
    let default_patterns = default_companion_extensions();
    let patterns: Vec<(&str, Vec<&str>)> = match companion_patterns {
        Some(p) => p.iter().map(|(k, v)| (*k, v.clone())).collect(),
        None => default_patterns,
    };

    // Index by (folder, stem), preserving first-seen order.
    let mut order: Vec<(PathBuf, String)> = Vec::new();
    let mut index: BTreeMap<(PathBuf, String), Vec<FileItem>> = BTreeMap::new();
    for file in files {
        let key = (file.directory(), file.stem());
        if !index.contains_key(&key) {
            order.push(key.clone());
        }
        index.entry(key).or_default().push(file.clone());
    }

    let mut groups = Vec::new();
    for key in order {
        let Some(group_files) = index.remove(&key) else {
            continue;
        };
        let (folder, stem) = key;

        if group_files.len() > 1 {
            let extensions: Vec<String> = group_files
                .iter()
                .map(|f| format!(".{}", f.extension))
                .collect();

            let is_companion_group = patterns.iter().any(|(primary, companions)| {
                extensions.iter().any(|e| e == primary)
                    && companions.iter().any(|c| extensions.iter().any(|e| e == c))
            });

            if is_companion_group {
                let mut group = FileGroup::new(&folder);
                group.files = group_files;
                group.metadata.insert("group_type".into(), "companion".into());
                group.metadata.insert("basename".into(), stem);
                groups.push(group);
            } else {
                for file in group_files {
                    let mut group = FileGroup::new(&folder);
                    group.files = vec![file];
                    group.metadata.insert("group_type".into(), "standalone".into());
                    groups.push(group);
                }
            }
        } else {
            let mut group = FileGroup::new(&folder);
            group.files = group_files;
            group.metadata.insert("group_type".into(), "standalone".into());
            groups.push(group);
        }
    }

    groups
}

/// Find the group index and position within the group for a file.
/// Returns `None` when the file does not appear in any group.
pub fn file_group_index(file: &FileItem, groups: &[FileGroup]) -> Option<(usize, usize)> {
    for (group_idx, group) in groups.iter().enumerate() {
        for (file_idx, f) in group.files.iter().enumerate() {
            if f.full_path == file.full_path {
                return Some((group_idx, file_idx));
            }
        }
    }
    tracing::warn!("file not found in any group: {}", file.filename);
    None
}

/// Counter index for the `PER_FILEGROUP` scope: the file's position inside
/// its group. Falls back to the global index when the file is in no group.
pub fn filegroup_counter_index(
    file: &FileItem,
    all_files: &[FileItem],
    global_index: usize,
    groups: Option<&[FileGroup]>,
) -> usize {
    let folder_groups;
    let groups = match groups {
        Some(g) => g,
        None => {
            folder_groups = group_files_by_folder(all_files);
            folder_groups.as_slice()
        },
    };

    match file_group_index(file, groups) {
        Some((_, index_within_group)) => index_within_group,
        None => global_index,
    }
}

/// Convenience for callers that only need the folder of a path.
pub fn parent_folder(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn item(path: &str) -> FileItem {
        FileItem::new(path, Local::now())
    }

    #[test]
    fn test_group_by_folder_preserves_order() {
        let files = vec![
            item("/a/x1.jpg"),
            item("/b/y1.jpg"),
            item("/a/x2.jpg"),
        ];
        let groups = group_files_by_folder(&files);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].source_path, PathBuf::from("/a"));
        assert_eq!(groups[0].file_count(), 2);
        assert_eq!(groups[1].source_path, PathBuf::from("/b"));
        assert_eq!(groups[1].file_count(), 1);
    }

    #[test]
    fn test_add_file_deduplicates() {
        let mut group = FileGroup::new("/a");
        group.add_file(item("/a/x.jpg"));
        group.add_file(item("/a/x.jpg"));
        assert_eq!(group.file_count(), 1);
    }

    #[test]
    fn test_companion_grouping_raw_jpg() {
        let files = vec![
            item("/shoot/IMG_1.arw"),
            item("/shoot/IMG_1.jpg"),
            item("/shoot/IMG_2.arw"),
        ];
        let groups = group_files_by_companion(&files, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].metadata.get("group_type").unwrap(), "companion");
        assert_eq!(groups[0].file_count(), 2);
        assert_eq!(groups[1].metadata.get("group_type").unwrap(), "standalone");
    }

    #[test]
    fn test_same_stem_without_pattern_is_standalone() {
        let files = vec![item("/d/notes.txt"), item("/d/notes.md")];
        let groups = group_files_by_companion(&files, None);
        assert_eq!(groups.len(), 2);
        for group in &groups {
            assert_eq!(group.metadata.get("group_type").unwrap(), "standalone");
        }
    }

    #[test]
    fn test_filegroup_counter_index_defaults_to_folder_groups() {
        let files = vec![
            item("/a/x1.jpg"),
            item("/a/x2.jpg"),
            item("/b/y1.jpg"),
        ];
        assert_eq!(filegroup_counter_index(&files[0], &files, 0, None), 0);
        assert_eq!(filegroup_counter_index(&files[1], &files, 1, None), 1);
        assert_eq!(filegroup_counter_index(&files[2], &files, 2, None), 0);
    }

    #[test]
    fn test_filegroup_counter_index_missing_file_falls_back() {
        let files = vec![item("/a/x1.jpg")];
        let stranger = item("/elsewhere/z.jpg");
        assert_eq!(filegroup_counter_index(&stranger, &files, 7, None), 7);
    }

    #[test]
    fn test_scope_serde_and_display() {
        let s: CounterScope = serde_json::from_str("\"per_folder\"").unwrap();
        assert_eq!(s, CounterScope::PerFolder);
        assert_eq!(s.to_string(), "per_folder");
        assert_eq!(CounterScope::Global.display_name(), "Global (all files)");
        assert!(CounterScope::PerExtension.description().contains("extension"));
    }
}
