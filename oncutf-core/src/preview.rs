//! Preview generation: applies the module pipeline to a file list and
//! caches the resulting name pairs.

use crate::file_item::FileItem;
use crate::modules::{ModuleConfig, ModuleContext};
use crate::scope::effective_index;
use crate::services::BatchQueryProvider;
use crate::transform::NameTransform;
use crate::validate::{is_valid_filename_text, INVALID_FILENAME_MARKER};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long a cached preview stays valid. Short on purpose: the cache
/// exists to coalesce rapid UI edits, not to persist results.
pub const PREVIEW_CACHE_TTL: Duration = Duration::from_millis(100);

/// TTL of the per-file module memoization used while typing.
const MODULE_MEMO_TTL: Duration = Duration::from_millis(50);

/// Preview generation slower than this logs at info level.
const SLOW_PREVIEW_THRESHOLD: Duration = Duration::from_millis(50);

/// Default staleness horizon for consumers holding on to a result.
pub const PREVIEW_MAX_AGE: Duration = Duration::from_secs(300);

/// Output of one preview run: ordered `(old_name, new_name)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub name_pairs: Vec<(String, String)>,
    /// True iff at least one pair differs.
    pub has_changes: bool,
    /// Error messages from individual rows, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Creation time, used for staleness checks.
    pub timestamp: DateTime<Local>,
}

impl PreviewResult {
    pub fn new(name_pairs: Vec<(String, String)>, has_changes: bool) -> Self {
        Self {
            name_pairs,
            has_changes,
            errors: Vec::new(),
            timestamp: Local::now(),
        }
    }

    /// Age of this result.
    pub fn age(&self) -> Duration {
        (Local::now() - self.timestamp).to_std().unwrap_or_default()
    }

    /// True when the result is older than [`PREVIEW_MAX_AGE`].
    pub fn is_stale(&self) -> bool {
        self.is_stale_after(PREVIEW_MAX_AGE)
    }

    pub fn is_stale_after(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

/// Sentinel outcome of the module pipeline for a single file.
enum PipelineOutput {
    Name(String),
    /// A metadata module needs metadata that is not available.
    MissingMetadata,
    /// A hash-backed module needs a hash that is not cached.
    MissingHash,
}

/// Orchestrates preview generation: bulk availability queries, the module
/// pipeline, post-transform, inline validation and the TTL cache.
pub struct PreviewManager {
    preview_cache: HashMap<String, (PreviewResult, Instant)>,
    module_memo: HashMap<(u64, usize, PathBuf), (String, Instant)>,
    cache_ttl: Duration,
}

impl Default for PreviewManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewManager {
    pub fn new() -> Self {
        Self {
            preview_cache: HashMap::new(),
            module_memo: HashMap::new(),
            cache_ttl: PREVIEW_CACHE_TTL,
        }
    }

    /// Produce `(old_name, new_name)` pairs for `files` under the given
    /// pipeline. Serves from the TTL cache when the same request repeats
    /// within the window.
    pub fn generate_preview(
        &mut self,
        files: &[FileItem],
        modules: &[ModuleConfig],
        post_transform: &NameTransform,
        ctx: &ModuleContext<'_>,
    ) -> PreviewResult {
        if files.is_empty() {
            return PreviewResult::new(Vec::new(), false);
        }

        let cache_key = cache_key(files, modules, post_transform);
        if let Some((result, inserted)) = self.preview_cache.get(&cache_key) {
            if inserted.elapsed() < self.cache_ttl {
                tracing::debug!("using cached preview");
                return result.clone();
            }
            self.preview_cache.remove(&cache_key);
        }

        let provider = BatchQueryProvider::new(ctx.metadata, ctx.hashes);
        let hash_availability = provider.hash_availability(files);
        let metadata_availability = provider.metadata_availability(files);

        let start = Instant::now();
        let modules_hash = hash_of(&modules_json(modules));
        let mut name_pairs = Vec::with_capacity(files.len());

        for (idx, file) in files.iter().enumerate() {
            let output = self.apply_modules_with_context(
                file,
                modules,
                idx,
                modules_hash,
                ctx,
                &hash_availability,
                &metadata_availability,
                files,
            );

            let new_fullname = match output {
                PipelineOutput::Name(name) => name,
                // Required data missing: leave the row unchanged.
                PipelineOutput::MissingMetadata | PipelineOutput::MissingHash => {
                    name_pairs.push((file.filename.clone(), file.filename.clone()));
                    continue;
                },
            };

            let extension = file.extension_with_dot();
            let mut new_basename = strip_extension(&new_fullname, &extension);

            if post_transform.is_effective() {
                new_basename = post_transform.apply(&new_basename);
            }

            if !is_valid_filename_text(&new_basename)
                || new_basename.contains(INVALID_FILENAME_MARKER)
            {
                name_pairs.push((file.filename.clone(), file.filename.clone()));
                continue;
            }

            let new_name = format!("{new_basename}{extension}");
            name_pairs.push((file.filename.clone(), new_name));
        }

        let has_changes = name_pairs.iter().any(|(old, new)| old != new);
        let result = PreviewResult::new(name_pairs, has_changes);
        self.preview_cache
            .insert(cache_key, (result.clone(), Instant::now()));

        let elapsed = start.elapsed();
        if elapsed > SLOW_PREVIEW_THRESHOLD {
            tracing::info!(
                "preview generation took {:.3}s for {} files",
                elapsed.as_secs_f64(),
                files.len()
            );
        }

        result
    }

    /// Apply the pipeline for one file, short-circuiting when a module's
    /// data preconditions are not met.
    #[allow(clippy::too_many_arguments)]
    fn apply_modules_with_context(
        &mut self,
        file: &FileItem,
        modules: &[ModuleConfig],
        index: usize,
        modules_hash: u64,
        ctx: &ModuleContext<'_>,
        hash_availability: &HashMap<PathBuf, bool>,
        metadata_availability: &HashMap<PathBuf, bool>,
        all_files: &[FileItem],
    ) -> PipelineOutput {
        use crate::modules::MetadataCategory;

        for module in modules {
            if let ModuleConfig::Metadata { category, .. } = module {
                match category {
                    MetadataCategory::Hash => {
                        if !hash_availability.get(&file.full_path).copied().unwrap_or(false) {
                            return PipelineOutput::MissingHash;
                        }
                    },
                    MetadataCategory::MetadataKeys => {
                        if !metadata_availability
                            .get(&file.full_path)
                            .copied()
                            .unwrap_or(false)
                        {
                            return PipelineOutput::MissingMetadata;
                        }
                    },
                    MetadataCategory::FileDates => {},
                }
            }
        }

        PipelineOutput::Name(self.apply_rename_modules(file, modules, index, modules_hash, ctx, all_files))
    }

    /// Concatenate module outputs in order. Hot path while the user types,
    /// so results are memoized briefly per `(pipeline, index, file)`.
    fn apply_rename_modules(
        &mut self,
        file: &FileItem,
        modules: &[ModuleConfig],
        index: usize,
        modules_hash: u64,
        ctx: &ModuleContext<'_>,
        all_files: &[FileItem],
    ) -> String {
        let memo_key = (modules_hash, index, file.full_path.clone());
        if let Some((cached, inserted)) = self.module_memo.get(&memo_key) {
            if inserted.elapsed() < MODULE_MEMO_TTL {
                return cached.clone();
            }
            self.module_memo.remove(&memo_key);
        }

        let mut parts = Vec::with_capacity(modules.len());
        for module in modules {
            let module_index = match module.counter_scope() {
                Some(scope) => effective_index(scope, index, file, Some(all_files), None),
                None => index,
            };
            parts.push(module.apply(file, module_index, ctx));
        }
        let joined = parts.concat();

        self.module_memo
            .insert(memo_key, (joined.clone(), Instant::now()));
        joined
    }

    /// Drop cached preview results. Called after any action that could
    /// invalidate them: file-set changes, module reorder, post-transform
    /// edits.
    pub fn clear_cache(&mut self) {
        self.preview_cache.clear();
    }

    /// Drop the preview cache and the module-level memoization.
    pub fn clear_all_caches(&mut self) {
        self.preview_cache.clear();
        self.module_memo.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.preview_cache.len()
    }
}

/// Strip the extension from a generated fullname if present, case-
/// insensitively, so modules that emit full filenames do not double it.
fn strip_extension(fullname: &str, extension: &str) -> String {
    if !extension.is_empty() && fullname.to_lowercase().ends_with(&extension.to_lowercase()) {
        fullname[..fullname.len() - extension.len()].to_string()
    } else {
        fullname.to_string()
    }
}

/// Stable cache key over the file set, pipeline and post-transform.
/// Configuration is serialised as canonical JSON; the string form is the
/// fallback if serialisation ever fails.
fn cache_key(files: &[FileItem], modules: &[ModuleConfig], post_transform: &NameTransform) -> String {
    let mut path_hasher = DefaultHasher::new();
    for file in files {
        file.full_path.hash(&mut path_hasher);
    }

    let modules_hash = hash_of(&modules_json(modules));
    let transform_hash = hash_of(
        &serde_json::to_string(post_transform).unwrap_or_else(|_| format!("{post_transform:?}")),
    );

    format!("{}_{modules_hash}_{transform_hash}", path_hasher.finish())
}

fn modules_json(modules: &[ModuleConfig]) -> String {
    serde_json::to_string(modules).unwrap_or_else(|_| format!("{modules:?}"))
}

fn hash_of(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_group::CounterScope;
    use crate::services::{MemoryHashCache, MemoryMetadataCache};
    use chrono::Local;

    fn item(path: &str) -> FileItem {
        FileItem::new(path, Local::now())
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("photo.jpg", ".jpg"), "photo");
        assert_eq!(strip_extension("photo.JPG", ".jpg"), "photo");
        assert_eq!(strip_extension("photo", ".jpg"), "photo");
        assert_eq!(strip_extension("photo", ""), "photo");
    }

    #[test]
    fn test_empty_file_list() {
        let metadata = MemoryMetadataCache::new();
        let hashes = MemoryHashCache::new();
        let ctx = ModuleContext {
            metadata: &metadata,
            hashes: &hashes,
        };
        let mut manager = PreviewManager::new();
        let result =
            manager.generate_preview(&[], &[], &NameTransform::default(), &ctx);
        assert!(result.name_pairs.is_empty());
        assert!(!result.has_changes);
    }

    #[test]
    fn test_missing_metadata_falls_back_to_original() {
        let metadata = MemoryMetadataCache::new();
        let hashes = MemoryHashCache::new();
        let ctx = ModuleContext {
            metadata: &metadata,
            hashes: &hashes,
        };
        let mut manager = PreviewManager::new();
        let files = vec![item("/a/photo.jpg")];
        let modules = vec![ModuleConfig::Metadata {
            field: "camera".into(),
            category: crate::modules::MetadataCategory::MetadataKeys,
        }];

        let result =
            manager.generate_preview(&files, &modules, &NameTransform::default(), &ctx);
        assert_eq!(result.name_pairs[0], ("photo.jpg".into(), "photo.jpg".into()));
        assert!(!result.has_changes);
    }

    #[test]
    fn test_counter_scope_respected_in_pipeline() {
        let metadata = MemoryMetadataCache::new();
        let hashes = MemoryHashCache::new();
        let ctx = ModuleContext {
            metadata: &metadata,
            hashes: &hashes,
        };
        let mut manager = PreviewManager::new();
        let files = vec![
            item("/A/x1.jpg"),
            item("/A/x2.jpg"),
            item("/B/x3.jpg"),
        ];
        let modules = vec![ModuleConfig::Counter {
            start: 1,
            step: 1,
            padding: 2,
            scope: CounterScope::PerFolder,
        }];

        let result =
            manager.generate_preview(&files, &modules, &NameTransform::default(), &ctx);
        let new_names: Vec<&str> = result
            .name_pairs
            .iter()
            .map(|(_, new)| new.as_str())
            .collect();
        assert_eq!(new_names, vec!["01.jpg", "02.jpg", "01.jpg"]);
    }

    #[test]
    fn test_preview_result_staleness() {
        let result = PreviewResult::new(vec![], false);
        assert!(!result.is_stale());
        assert!(result.is_stale_after(Duration::from_nanos(1)) || result.age() == Duration::ZERO);
    }
}
