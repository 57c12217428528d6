//! The JSON batch spec accepted by `oncutf preview` and `oncutf rename`.

use anyhow::{Context, Result};
use oncutf_core::preview::PreviewResult;
use oncutf_core::services::{MemoryHashCache, MemoryMetadataCache, DEFAULT_HASH_ALGORITHM};
use oncutf_core::validation::ValidationResult;
use oncutf_core::{Config, FileItem, ModuleConfig, NameTransform, RenameEngine};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A complete rename request: files, pipeline, post-transform and the
/// metadata/hash values the modules may consult.
#[derive(Debug, Deserialize)]
pub struct BatchSpec {
    /// Paths of the files to rename, in preview order.
    pub files: Vec<PathBuf>,

    /// Module pipeline, applied in order.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,

    /// Post-transform applied to each composed basename.
    #[serde(default)]
    pub post_transform: NameTransform,

    /// Metadata per file path, made available to metadata modules.
    #[serde(default)]
    pub metadata: HashMap<PathBuf, BTreeMap<String, String>>,

    /// Cached hash values per file path (default algorithm).
    #[serde(default)]
    pub hashes: HashMap<PathBuf, String>,
}

impl BatchSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch spec: {}", path.display()))?;
        let spec: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch spec: {}", path.display()))?;
        Ok(spec)
    }

    /// Materialise the file list, reading size and mtime from disk.
    pub fn file_items(&self) -> Vec<FileItem> {
        self.files.iter().map(FileItem::from_path).collect()
    }

    /// Engine wired with in-memory stores holding the spec's metadata and
    /// hashes.
    pub fn build_engine(&self) -> Result<RenameEngine> {
        let mut metadata = MemoryMetadataCache::new();
        for (path, fields) in &self.metadata {
            metadata.insert(path.clone(), fields.clone());
        }

        let mut hashes = MemoryHashCache::new();
        for (path, value) in &self.hashes {
            hashes.insert(path.clone(), DEFAULT_HASH_ALGORITHM, value);
        }

        let config = Config::load().unwrap_or_default();
        Ok(RenameEngine::with_config(
            config,
            Arc::new(metadata),
            Arc::new(hashes),
        ))
    }
}

/// JSON document emitted by `oncutf preview`.
#[derive(Debug, Serialize)]
pub struct PreviewReport {
    pub preview: PreviewResult,
    pub validation: ValidationResult,
}

/// JSON document emitted by `oncutf rename --dry-run`.
#[derive(Debug, Serialize)]
pub struct DryRunReport {
    pub preview: PreviewResult,
    pub validation: ValidationResult,
    pub preflight_summary: String,
    pub preflight_ok: bool,
}
