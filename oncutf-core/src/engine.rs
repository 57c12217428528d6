//! The rename engine facade: preview, validate, execute.
//!
//! One entry point tying together the preview manager, validation
//! manager, execution manager, pre-execution validator, conflict resolver
//! and state tracking. The engine owns no process-wide state; the
//! metadata and hash stores are injected as interfaces.

use crate::config::Config;
use crate::conflicts::{ConflictResolution, ConflictResolver, ResolveStrategy};
use crate::execution::{ConflictCallback, ExecutionManager, ExecutionResult, NameValidator};
use crate::file_item::FileItem;
use crate::modules::{ModuleConfig, ModuleContext};
use crate::pre_execution::{PreExecutionValidator, PreflightResult};
use crate::preview::{PreviewManager, PreviewResult};
use crate::services::{BatchQueryProvider, HashLookup, MetadataLookup};
use crate::state::{RenameState, RenameStateManager};
use crate::transform::NameTransform;
use crate::validation::{ValidationManager, ValidationResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Number of files processed per batch by [`RenameEngine::batch_process_files`].
const BATCH_SIZE: usize = 50;

/// Facade over the preview -> validate -> execute workflow.
pub struct RenameEngine {
    config: Config,
    metadata: Arc<dyn MetadataLookup>,
    hashes: Arc<dyn HashLookup>,
    preview_manager: PreviewManager,
    validation_manager: ValidationManager,
    execution_manager: ExecutionManager,
    conflict_resolver: ConflictResolver,
    state_manager: RenameStateManager,
}

impl RenameEngine {
    /// Engine with configuration loaded from `.oncutf/config.toml` (or
    /// defaults). The metadata and hash stores are the caller's.
    pub fn new(metadata: Arc<dyn MetadataLookup>, hashes: Arc<dyn HashLookup>) -> Self {
        Self::with_config(Config::load().unwrap_or_default(), metadata, hashes)
    }

    pub fn with_config(
        config: Config,
        metadata: Arc<dyn MetadataLookup>,
        hashes: Arc<dyn HashLookup>,
    ) -> Self {
        let conflict_resolver = ConflictResolver::with_backup_dir(config.backup_dir())
            .with_capacity(config.defaults.undo_capacity);
        let execution_manager = ExecutionManager::new(config.rename_companions());

        tracing::debug!("rename engine initialized");

        Self {
            config,
            metadata,
            hashes,
            preview_manager: PreviewManager::new(),
            validation_manager: ValidationManager::new(),
            execution_manager,
            conflict_resolver,
            state_manager: RenameStateManager::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate `(old_name, new_name)` pairs for `files` under the given
    /// pipeline, updating the engine state.
    pub fn generate_preview(
        &mut self,
        files: &[FileItem],
        modules: &[ModuleConfig],
        post_transform: &NameTransform,
    ) -> PreviewResult {
        let ctx = ModuleContext {
            metadata: self.metadata.as_ref(),
            hashes: self.hashes.as_ref(),
        };
        let result = self
            .preview_manager
            .generate_preview(files, modules, post_transform, &ctx);

        let new_state = RenameState {
            files: files.to_vec(),
            modules_data: modules.to_vec(),
            post_transform: *post_transform,
            preview_result: Some(result.clone()),
            ..Default::default()
        };
        self.state_manager.update_state(new_state);

        result
    }

    /// Validate preview pairs, updating the engine state.
    pub fn validate_preview(&mut self, pairs: &[(String, String)]) -> ValidationResult {
        let result = self.validation_manager.validate_preview(pairs);

        let mut state = self.state_manager.state().clone();
        state.validation_result = Some(result.clone());
        self.state_manager.update_state(state);

        result
    }

    /// Check files against the live filesystem before renaming.
    pub fn preflight(&self, files: &[FileItem]) -> PreflightResult {
        PreExecutionValidator::new(self.config.defaults.check_hash).validate(files)
    }

    /// Apply the renames, updating the engine state.
    pub fn execute_rename(
        &mut self,
        files: &[FileItem],
        new_names: &[String],
        conflict_callback: Option<&mut ConflictCallback<'_>>,
        validator: Option<&NameValidator<'_>>,
    ) -> ExecutionResult {
        let result =
            self.execution_manager
                .execute_rename(files, new_names, conflict_callback, validator);

        let mut state = self.state_manager.state().clone();
        state.execution_result = Some(result.clone());
        self.state_manager.update_state(state);

        result
    }

    pub fn get_current_state(&self) -> &RenameState {
        self.state_manager.state()
    }

    pub fn reset_state_changes(&mut self) {
        self.state_manager.reset_changes();
    }

    /// Drop preview and validation caches.
    pub fn clear_cache(&mut self) {
        self.preview_manager.clear_cache();
        self.validation_manager.clear_cache();
        tracing::debug!("engine caches cleared");
    }

    /// Drop every cache, including the pipeline applier's memoization.
    pub fn clear_all_caches(&mut self) {
        self.preview_manager.clear_all_caches();
        self.validation_manager.clear_cache();
    }

    pub fn get_hash_availability(&self, files: &[FileItem]) -> HashMap<PathBuf, bool> {
        BatchQueryProvider::new(self.metadata.as_ref(), self.hashes.as_ref())
            .hash_availability(files)
    }

    pub fn get_metadata_availability(&self, files: &[FileItem]) -> HashMap<PathBuf, bool> {
        BatchQueryProvider::new(self.metadata.as_ref(), self.hashes.as_ref())
            .metadata_availability(files)
    }

    /// Undo the most recent operation recorded by the conflict resolver.
    pub fn undo_last_operation(&mut self) -> Option<ConflictResolution> {
        self.conflict_resolver.undo_last_operation()
    }

    /// Repeat the most recently undone operation.
    pub fn redo_last_operation(&mut self) -> Option<ConflictResolution> {
        self.conflict_resolver.redo_last_operation()
    }

    pub fn clear_conflict_history(&mut self) {
        self.conflict_resolver.clear_history();
    }

    pub fn conflict_stats(&self) -> crate::conflicts::ConflictStats {
        self.conflict_resolver.stats()
    }

    /// Run `processor` over `files` in batches of 50, collecting one
    /// result per batch.
    pub fn batch_process_files<T>(
        &self,
        files: &[FileItem],
        mut processor: impl FnMut(&[FileItem]) -> T,
    ) -> Vec<T> {
        files.chunks(BATCH_SIZE).map(|chunk| processor(chunk)).collect()
    }

    /// Resolve `(old, new)` operations with a non-interactive strategy.
    pub fn resolve_conflicts_batch(
        &mut self,
        operations: &[(PathBuf, PathBuf)],
        strategy: ResolveStrategy,
    ) -> Vec<ConflictResolution> {
        self.conflict_resolver
            .batch_resolve_conflicts(operations, strategy)
    }
}
