//! Validation of preview pairs: intrinsic filename validity and
//! intra-batch duplicate detection. Filesystem conflicts are the
//! execution manager's concern, not this module's.

use crate::validate::validate_filename_part;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::{Duration, Instant};

/// TTL of the validation cache; mirrors the preview cache window.
const VALIDATION_CACHE_TTL: Duration = Duration::from_millis(100);

/// Validation verdict for a single preview entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationItem {
    pub old_name: String,
    pub new_name: String,
    /// The proposed stem passes filename validation.
    pub is_valid: bool,
    /// The proposed name already appeared earlier in this batch.
    pub is_duplicate: bool,
    /// `old_name == new_name`, byte for byte.
    pub is_unchanged: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

/// Aggregate verdict over one preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub items: Vec<ValidationItem>,
    /// Target names that occurred more than once.
    pub duplicates: BTreeSet<String>,
    pub has_errors: bool,
    /// True when every item is unchanged (nothing to rename).
    pub has_unchanged: bool,
    pub unchanged_count: usize,
    /// Valid items that actually change their name.
    pub valid_count: usize,
    pub invalid_count: usize,
    pub duplicate_count: usize,
}

impl ValidationResult {
    /// Build the aggregate from per-item verdicts, deriving all counts.
    pub fn new(items: Vec<ValidationItem>, duplicates: BTreeSet<String>) -> Self {
        let has_errors = items.iter().any(|i| !i.is_valid);
        let unchanged_count = items.iter().filter(|i| i.is_unchanged).count();
        let has_unchanged = !items.is_empty() && unchanged_count == items.len();
        let valid_count = items
            .iter()
            .filter(|i| i.is_valid && !i.is_unchanged)
            .count();
        let invalid_count = items.iter().filter(|i| !i.is_valid).count();
        // Every row whose target collides counts as a duplicate, including
        // the first occurrence; `is_duplicate` flags only the repeats.
        let duplicate_count = items
            .iter()
            .filter(|i| duplicates.contains(&i.new_name))
            .count();

        Self {
            items,
            duplicates,
            has_errors,
            has_unchanged,
            unchanged_count,
            valid_count,
            invalid_count,
            duplicate_count,
        }
    }
}

/// Walks preview pairs in order and produces a [`ValidationResult`],
/// caching recent runs briefly.
pub struct ValidationManager {
    cache: HashMap<u64, (ValidationResult, Instant)>,
    cache_ttl: Duration,
}

impl Default for ValidationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            cache_ttl: VALIDATION_CACHE_TTL,
        }
    }

    /// Validate `(old_name, new_name)` pairs: intrinsic validity of the
    /// stem, duplicate targets, unchanged rows.
    pub fn validate_preview(&mut self, pairs: &[(String, String)]) -> ValidationResult {
        let key = cache_key(pairs);
        if let Some((result, inserted)) = self.cache.get(&key) {
            if inserted.elapsed() < self.cache_ttl {
                tracing::debug!("using cached validation");
                return result.clone();
            }
            self.cache.remove(&key);
        }

        let mut items = Vec::with_capacity(pairs.len());
        let mut duplicates = BTreeSet::new();
        let mut seen_names: HashSet<&str> = HashSet::with_capacity(pairs.len());

        for (old_name, new_name) in pairs {
            let stem = Path::new(new_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (is_valid, error_message) = match validate_filename_part(&stem) {
                Ok(_) => (true, String::new()),
                Err(e) => (false, e.to_string()),
            };

            let is_duplicate = seen_names.contains(new_name.as_str());
            if is_duplicate {
                duplicates.insert(new_name.clone());
            } else {
                seen_names.insert(new_name);
            }

            items.push(ValidationItem {
                old_name: old_name.clone(),
                new_name: new_name.clone(),
                is_valid,
                is_duplicate,
                is_unchanged: old_name == new_name,
                error_message,
            });
        }

        let result = ValidationResult::new(items, duplicates);
        self.cache.insert(key, (result.clone(), Instant::now()));
        result
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn cache_key(pairs: &[(String, String)]) -> u64 {
    let mut hasher = DefaultHasher::new();
    pairs.hash(&mut hasher);
    hasher.finish()
}
