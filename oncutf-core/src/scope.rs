//! Scope-aware counter indexing.
//!
//! Counter modules receive an *effective index* instead of the global file
//! index so numbering can restart at folder, extension or group
//! boundaries. Ties within a scope are broken by ascending global index,
//! which makes the values deterministic for a given input order.

use crate::file_group::{filegroup_counter_index, CounterScope, FileGroup};
use crate::file_item::FileItem;

/// Compute the effective counter index for `file` under `scope`.
///
/// `all_files` is the full input list in preview order. When it is absent
/// the indexer degrades to the global index. `groups` supplies a
/// caller-provided grouping for the filegroup and selection scopes; when
/// `None`, filegroup scope falls back to grouping by folder and selection
/// scope to the global index.
pub fn effective_index(
    scope: CounterScope,
    global_index: usize,
    file: &FileItem,
    all_files: Option<&[FileItem]>,
    groups: Option<&[FileGroup]>,
) -> usize {
    match scope {
        CounterScope::Global => global_index,
        CounterScope::PerFolder => {
            let Some(all_files) = all_files else {
                return global_index;
            };
            let folder = file.directory();
            all_files
                .iter()
                .take(global_index)
                .filter(|f| f.directory() == folder)
                .count()
        },
        CounterScope::PerExtension => {
            let Some(all_files) = all_files else {
                return global_index;
            };
            let extension = file.extension.to_lowercase();
            all_files
                .iter()
                .take(global_index)
                .filter(|f| f.extension.to_lowercase() == extension)
                .count()
        },
        CounterScope::PerFilegroup => {
            let Some(all_files) = all_files else {
                return global_index;
            };
            filegroup_counter_index(file, all_files, global_index, groups)
        },
        CounterScope::PerSelection => {
            // Selection scope needs a caller-supplied grouping; without a
            // selection provider it behaves like the global counter.
            match (all_files, groups) {
                (Some(all_files), Some(groups)) => {
                    filegroup_counter_index(file, all_files, global_index, Some(groups))
                },
                _ => global_index,
            }
        },
    }
}
