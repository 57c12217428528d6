#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod case_rename;
pub mod companions;
pub mod config;
pub mod conflicts;
pub mod engine;
pub mod execution;
pub mod file_group;
pub mod file_item;
pub mod modules;
pub mod pre_execution;
pub mod preview;
pub mod scope;
pub mod services;
pub mod state;
pub mod transform;
pub mod validate;
pub mod validation;

pub use case_rename::{detect_case_insensitive_fs, is_case_only_change, safe_case_rename};
pub use companions::{
    companion_rename_pairs, find_companion_files, group_files_with_companions, is_companion_file,
    main_file_for_companion, CompanionGroup, CompanionGroupKind,
};
pub use config::Config;
pub use conflicts::{
    ConflictOperation, ConflictResolution, ConflictResolver, ConflictStats, ResolveStrategy,
    UndoStack,
};
pub use engine::RenameEngine;
pub use execution::{
    ConflictCallback, ConflictDecision, ExecutionItem, ExecutionManager, ExecutionResult,
    NameValidator,
};
pub use file_group::{
    file_group_index, filegroup_counter_index, group_files_by_companion, group_files_by_folder,
    CounterScope, FileGroup,
};
pub use file_item::FileItem;
pub use modules::{
    find_descriptor, module_descriptors, MetadataCategory, ModuleConfig, ModuleContext,
    ModuleDescriptor, TextRemovalPosition,
};
pub use pre_execution::{
    PreExecutionValidator, PreflightIssue, PreflightIssueKind, PreflightResult,
};
pub use preview::{PreviewManager, PreviewResult};
pub use scope::effective_index;
pub use services::{
    BatchQueryProvider, ContentHasher, HashLookup, MemoryHashCache, MemoryMetadataCache,
    MetadataLookup, Sha256Hasher,
};
pub use state::{RenameState, RenameStateManager};
pub use transform::{CaseTransform, NameTransform, SeparatorTransform};
pub use validate::{
    clean_for_filename, clean_filename_text, is_valid_filename_char, is_valid_filename_text,
    validate_filename_part, FilenameError, INVALID_FILENAME_CHARS, INVALID_FILENAME_MARKER,
};
pub use validation::{ValidationItem, ValidationManager, ValidationResult};
