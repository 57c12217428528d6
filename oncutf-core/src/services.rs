use crate::file_item::FileItem;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Lookup contract for the external metadata store.
///
/// Keys prefixed with `_` and the keys `path` / `filename` are internal
/// bookkeeping and ignored by the availability check.
pub trait MetadataLookup {
    /// Metadata mapping for one file, if any is cached.
    fn get(&self, path: &Path) -> Option<BTreeMap<String, String>>;

    /// Bulk lookup. The default loops over [`MetadataLookup::get`];
    /// implementations backed by a database should batch the query.
    fn get_batch(&self, paths: &[PathBuf]) -> HashMap<PathBuf, BTreeMap<String, String>> {
        paths
            .iter()
            .filter_map(|p| self.get(p).map(|m| (p.clone(), m)))
            .collect()
    }
}

/// Lookup contract for the external hash cache.
pub trait HashLookup {
    /// Cached hash value for one file and algorithm, lowercase hex.
    fn hash_for_file(&self, path: &Path, algorithm: &str) -> Option<String>;

    /// Which of `paths` have a cached hash for `algorithm`. The default
    /// loops over [`HashLookup::hash_for_file`]; real backends should issue
    /// a single batch query.
    fn files_with_hash(&self, paths: &[PathBuf], algorithm: &str) -> HashSet<PathBuf> {
        paths
            .iter()
            .filter(|p| self.hash_for_file(p, algorithm).is_some())
            .cloned()
            .collect()
    }
}

/// In-memory metadata store. Reference implementation for tests and for
/// the CLI, which loads metadata from the batch spec.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataCache {
    entries: HashMap<PathBuf, BTreeMap<String, String>>,
}

impl MemoryMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, metadata: BTreeMap<String, String>) {
        self.entries.insert(path.into(), metadata);
    }

    pub fn insert_field(&mut self, path: impl Into<PathBuf>, key: &str, value: &str) {
        self.entries
            .entry(path.into())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl MetadataLookup for MemoryMetadataCache {
    fn get(&self, path: &Path) -> Option<BTreeMap<String, String>> {
        self.entries.get(path).cloned()
    }
}

/// In-memory hash store, keyed by `(path, algorithm)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryHashCache {
    entries: HashMap<(PathBuf, String), String>,
}

impl MemoryHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, algorithm: &str, value: &str) {
        self.entries
            .insert((path.into(), algorithm.to_uppercase()), value.to_string());
    }
}

impl HashLookup for MemoryHashCache {
    fn hash_for_file(&self, path: &Path, algorithm: &str) -> Option<String> {
        self.entries
            .get(&(path.to_path_buf(), algorithm.to_uppercase()))
            .cloned()
    }
}

/// Default hash algorithm used for availability queries and stability
/// checks.
pub const DEFAULT_HASH_ALGORITHM: &str = "CRC32";

/// Bulk availability queries over the external caches.
///
/// This is the only place in the engine that talks to the metadata and
/// hash stores; preview generation performs at most one bulk read per
/// store. Errors degrade to a conservative `false`.
pub struct BatchQueryProvider<'a> {
    metadata: &'a dyn MetadataLookup,
    hashes: &'a dyn HashLookup,
}

impl<'a> BatchQueryProvider<'a> {
    pub fn new(metadata: &'a dyn MetadataLookup, hashes: &'a dyn HashLookup) -> Self {
        Self { metadata, hashes }
    }

    /// Per file: does the hash cache know this file?
    pub fn hash_availability(&self, files: &[FileItem]) -> HashMap<PathBuf, bool> {
        if files.is_empty() {
            return HashMap::new();
        }

        let paths: Vec<PathBuf> = files.iter().map(|f| f.full_path.clone()).collect();
        let known = self.hashes.files_with_hash(&paths, DEFAULT_HASH_ALGORITHM);

        paths
            .into_iter()
            .map(|p| {
                let has = known.contains(&p);
                (p, has)
            })
            .collect()
    }

    /// Per file: does the metadata store hold at least one non-internal key?
    pub fn metadata_availability(&self, files: &[FileItem]) -> HashMap<PathBuf, bool> {
        if files.is_empty() {
            return HashMap::new();
        }

        let paths: Vec<PathBuf> = files.iter().map(|f| f.full_path.clone()).collect();
        let entries = self.metadata.get_batch(&paths);

        paths
            .into_iter()
            .map(|p| {
                let has = entries
                    .get(&p)
                    .map(|data| data.keys().any(|k| !is_internal_key(k)))
                    .unwrap_or(false);
                (p, has)
            })
            .collect()
    }
}

fn is_internal_key(key: &str) -> bool {
    key.starts_with('_') || key == "path" || key == "filename"
}

/// Computes content hashes for stability checks. Separate from
/// [`HashLookup`] because the lookup only reports cached values.
pub trait ContentHasher {
    fn compute(&self, path: &Path) -> Result<String>;
}

/// SHA-256 content hasher, lowercase hex output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn compute(&self, path: &Path) -> Result<String> {
        let contents = std::fs::read(path)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
