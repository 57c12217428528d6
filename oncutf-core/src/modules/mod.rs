//! Name-fragment modules.
//!
//! Each module produces one string fragment for a file; the pipeline
//! applier concatenates fragments in configuration order. Modules are pure
//! functions of `(config, file, effective index, lookups)` and signal an
//! invalid fragment through [`crate::validate::INVALID_FILENAME_MARKER`]
//! rather than an error.

pub mod counter;
pub mod metadata;
pub mod original_name;
pub mod specified_text;
pub mod text_removal;

use crate::file_group::CounterScope;
use crate::file_item::FileItem;
use crate::services::{HashLookup, MetadataLookup};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use metadata::MetadataCategory;
pub use text_removal::TextRemovalPosition;

/// Tagged configuration for one rename module.
///
/// The wire format matches the module type tags the application has always
/// used (`counter`, `specified_text`, ...), so saved pipelines stay
/// readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleConfig {
    Counter {
        #[serde(default = "default_counter_start")]
        start: i64,
        #[serde(default = "default_counter_step")]
        step: i64,
        #[serde(default = "default_counter_padding")]
        padding: usize,
        #[serde(default)]
        scope: CounterScope,
    },
    SpecifiedText {
        #[serde(default)]
        text: String,
    },
    OriginalName {
        #[serde(default)]
        greeklish: bool,
    },
    RemoveTextFromOriginalName {
        #[serde(default)]
        text_to_remove: String,
        #[serde(default)]
        position: TextRemovalPosition,
        #[serde(default)]
        case_sensitive: bool,
    },
    Metadata {
        #[serde(default)]
        field: String,
        #[serde(default)]
        category: MetadataCategory,
    },
}

fn default_counter_start() -> i64 {
    1
}

fn default_counter_step() -> i64 {
    1
}

fn default_counter_padding() -> usize {
    4
}

/// External lookups available to modules during application.
#[derive(Clone, Copy)]
pub struct ModuleContext<'a> {
    pub metadata: &'a dyn MetadataLookup,
    pub hashes: &'a dyn HashLookup,
}

impl ModuleConfig {
    /// Counter scope if this is a counter module.
    pub fn counter_scope(&self) -> Option<CounterScope> {
        match self {
            Self::Counter { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// True when the module contributes output under its current
    /// configuration. Counters and the original-name module always do.
    pub fn is_effective(&self) -> bool {
        match self {
            Self::Counter { .. } | Self::OriginalName { .. } => true,
            Self::SpecifiedText { text } => !text.is_empty(),
            Self::RemoveTextFromOriginalName { text_to_remove, .. } => {
                !text_to_remove.trim().is_empty()
            },
            Self::Metadata { field, category } => match category {
                MetadataCategory::Hash => field.starts_with("hash_"),
                _ => !field.is_empty(),
            },
        }
    }

    /// Produce this module's fragment for `file`.
    ///
    /// `index` must already be scope-adjusted for counter modules; the
    /// pipeline applier is responsible for that (see [`crate::scope`]).
    pub fn apply(&self, file: &FileItem, index: usize, ctx: &ModuleContext<'_>) -> String {
        match self {
            Self::Counter {
                start,
                step,
                padding,
                ..
            } => counter::apply(*start, *step, *padding, index),
            Self::SpecifiedText { text } => specified_text::apply(text),
            Self::OriginalName { greeklish } => original_name::apply(*greeklish, file),
            Self::RemoveTextFromOriginalName {
                text_to_remove,
                position,
                case_sensitive,
            } => {
                let result = text_removal::apply(text_to_remove, *position, *case_sensitive, file);
                // The removal module yields a full filename; only the stem
                // contributes to the composed name.
                Path::new(&result)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            },
            Self::Metadata { field, category } => metadata::apply(field, *category, file, ctx),
        }
    }
}

/// Describes a module type for UI listings and tooling. The registry is a
/// build-time table; adding a module means adding its variant, its
/// submodule and one entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Internal ID, equal to the serde tag.
    pub name: &'static str,
    /// UI label.
    pub display_name: &'static str,
    /// Height hint for module widgets.
    pub ui_rows: u8,
    pub description: &'static str,
    /// Grouping for module pickers.
    pub category: &'static str,
}

/// All registered module types, in presentation order.
pub fn module_descriptors() -> &'static [ModuleDescriptor] {
    &[
        ModuleDescriptor {
            name: "original_name",
            display_name: "Original Name",
            ui_rows: 1,
            description: "Keep original filename with optional transformations",
            category: "Text",
        },
        ModuleDescriptor {
            name: "specified_text",
            display_name: "Text",
            ui_rows: 1,
            description: "Insert user-specified text",
            category: "Text",
        },
        ModuleDescriptor {
            name: "counter",
            display_name: "Counter",
            ui_rows: 2,
            description: "Sequential numbering with configurable scope",
            category: "Numbering",
        },
        ModuleDescriptor {
            name: "remove_text_from_original_name",
            display_name: "Remove Text",
            ui_rows: 2,
            description: "Remove text from the original filename",
            category: "Text",
        },
        ModuleDescriptor {
            name: "metadata",
            display_name: "Metadata",
            ui_rows: 2,
            description: "Extract file metadata (dates, hash, EXIF)",
            category: "Metadata",
        },
    ]
}

/// Look up a descriptor by its internal name.
pub fn find_descriptor(name: &str) -> Option<&'static ModuleDescriptor> {
    module_descriptors().iter().find(|d| d.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tags() {
        let cfg: ModuleConfig =
            serde_json::from_str(r#"{"type":"specified_text","text":"IMG_"}"#).unwrap();
        assert_eq!(
            cfg,
            ModuleConfig::SpecifiedText {
                text: "IMG_".into()
            }
        );

        let cfg: ModuleConfig = serde_json::from_str(r#"{"type":"counter"}"#).unwrap();
        assert_eq!(
            cfg,
            ModuleConfig::Counter {
                start: 1,
                step: 1,
                padding: 4,
                scope: CounterScope::PerFolder,
            }
        );

        let cfg: ModuleConfig = serde_json::from_str(
            r#"{"type":"remove_text_from_original_name","text_to_remove":"draft_"}"#,
        )
        .unwrap();
        assert!(cfg.is_effective());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let parsed: Result<ModuleConfig, _> =
            serde_json::from_str(r#"{"type":"frobnicate"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_effectiveness() {
        assert!(ModuleConfig::Counter {
            start: 1,
            step: 1,
            padding: 4,
            scope: CounterScope::Global
        }
        .is_effective());
        assert!(!ModuleConfig::SpecifiedText { text: String::new() }.is_effective());
        assert!(ModuleConfig::OriginalName { greeklish: false }.is_effective());
        assert!(!ModuleConfig::Metadata {
            field: "crc32".into(),
            category: MetadataCategory::Hash
        }
        .is_effective());
        assert!(ModuleConfig::Metadata {
            field: "hash_crc32".into(),
            category: MetadataCategory::Hash
        }
        .is_effective());
    }

    #[test]
    fn test_registry() {
        assert_eq!(module_descriptors().len(), 5);
        let counter = find_descriptor("counter").unwrap();
        assert_eq!(counter.display_name, "Counter");
        assert!(find_descriptor("nonexistent").is_none());
    }
}
