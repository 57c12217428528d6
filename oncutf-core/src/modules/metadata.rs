//! Metadata fragments: filesystem dates, cached hashes and metadata keys.

use super::ModuleContext;
use crate::file_item::FileItem;
use crate::validate::clean_for_filename;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which store a metadata module reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataCategory {
    #[default]
    FileDates,
    /// `tag` is the historical name for hash-backed fields.
    #[serde(alias = "tag")]
    Hash,
    MetadataKeys,
}

/// Field keys understood by the `file_dates` category.
pub fn file_date_fields() -> &'static [&'static str] {
    &[
        "last_modified_yymmdd",
        "last_modified_iso",
        "last_modified_eu",
        "last_modified_us",
        "last_modified_year",
        "last_modified_month",
        "last_modified_iso_time",
        "last_modified_eu_time",
        "last_modified_compact",
    ]
}

/// Produce the metadata fragment for `file`.
///
/// Missing data falls back to the original stem rather than failing; the
/// preview pipeline has already short-circuited rows whose store has
/// nothing at all (see the availability hints).
pub fn apply(
    field: &str,
    category: MetadataCategory,
    file: &FileItem,
    ctx: &ModuleContext<'_>,
) -> String {
    if field.is_empty() {
        tracing::debug!("metadata module with no field configured");
        return "invalid".to_string();
    }

    match category {
        MetadataCategory::FileDates => format_file_date(field, file),
        MetadataCategory::Hash => extract_hash(field, file, ctx),
        MetadataCategory::MetadataKeys => extract_metadata_key(field, file, ctx),
    }
}

/// Format the file's last-modified timestamp for the given field key.
/// Unknown keys fall back to the compact `%y%m%d` form. None of the
/// formats emit `:`/`/`/`\` so results are always filename-safe.
fn format_file_date(field: &str, file: &FileItem) -> String {
    let format = match field {
        "last_modified_yymmdd" => "%y%m%d",
        "last_modified_iso" => "%Y-%m-%d",
        "last_modified_eu" => "%d-%m-%Y",
        "last_modified_us" => "%m-%d-%Y",
        "last_modified_year" => "%Y",
        "last_modified_month" => "%Y-%m",
        "last_modified_iso_time" => "%Y-%m-%d_%H-%M",
        "last_modified_eu_time" => "%d-%m-%Y_%H-%M",
        "last_modified_compact" => "%y%m%d_%H%M",
        // Legacy key from early pipelines.
        "last_modified" => "%Y-%m-%d",
        _ => "%y%m%d",
    };

    file.modified.format(format).to_string()
}

/// Look up a cached hash. Valid only for `hash_*` fields; falls back to
/// the original stem when no hash is cached.
fn extract_hash(field: &str, file: &FileItem, ctx: &ModuleContext<'_>) -> String {
    let Some(algorithm) = field.strip_prefix("hash_") else {
        return "invalid".to_string();
    };

    match ctx.hashes.hash_for_file(&file.full_path, algorithm) {
        Some(value) => value,
        None => file.stem(),
    }
}

/// Legacy alias table: field key -> metadata keys to try, in order.
fn alias_keys(field: &str) -> Vec<&str> {
    match field {
        "creation_date" => vec!["creation_date", "date_created"],
        "date" => vec!["date"],
        other => vec![other],
    }
}

/// Look up a metadata key, trying legacy aliases, and clean the value for
/// filename safety. Falls back to the original stem when absent.
fn extract_metadata_key(field: &str, file: &FileItem, ctx: &ModuleContext<'_>) -> String {
    let store: Option<BTreeMap<String, String>> = ctx.metadata.get(&file.full_path);
    let metadata = match &store {
        Some(map) => map,
        // Files can carry metadata inline when the caller preloaded it.
        None => &file.metadata,
    };

    for key in alias_keys(field) {
        if let Some(value) = metadata.get(key) {
            if !value.is_empty() {
                return clean_for_filename(value);
            }
        }
    }

    file.stem()
}
