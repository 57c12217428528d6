//! The most recent preview/validation/execution results, with change
//! flags consumers can poll after each update. A UI adapter can map the
//! flags onto whatever signal mechanism it prefers; the core stays free
//! of observer dependencies.

use crate::execution::ExecutionResult;
use crate::file_item::FileItem;
use crate::modules::ModuleConfig;
use crate::preview::PreviewResult;
use crate::transform::NameTransform;
use crate::validation::ValidationResult;

/// Central container for the current rename workflow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameState {
    /// Files currently in the preview.
    pub files: Vec<FileItem>,
    /// Module configuration used to produce the preview.
    pub modules_data: Vec<ModuleConfig>,
    /// Post-transform settings applied after the modules.
    pub post_transform: NameTransform,
    pub preview_result: Option<PreviewResult>,
    pub validation_result: Option<ValidationResult>,
    pub execution_result: Option<ExecutionResult>,

    // Change flags, set by the state manager on update.
    pub preview_changed: bool,
    pub validation_changed: bool,
    pub execution_changed: bool,
}

/// Holds the current [`RenameState`] and flags what changed on each
/// update, by field-level comparison against the previous state.
#[derive(Debug, Default)]
pub struct RenameStateManager {
    current_state: RenameState,
    previous_state: Option<RenameState>,
}

impl RenameStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current state and compute change flags.
    pub fn update_state(&mut self, mut new_state: RenameState) {
        let previous = &self.current_state;
        new_state.preview_changed = previous.preview_result != new_state.preview_result;
        new_state.validation_changed = previous.validation_result != new_state.validation_result;
        new_state.execution_changed = previous.execution_result != new_state.execution_result;
        self.previous_state = Some(std::mem::replace(&mut self.current_state, new_state));
    }

    pub fn state(&self) -> &RenameState {
        &self.current_state
    }

    pub fn state_mut(&mut self) -> &mut RenameState {
        &mut self.current_state
    }

    /// The state before the last update, if any.
    pub fn previous_state(&self) -> Option<&RenameState> {
        self.previous_state.as_ref()
    }

    /// Clear all change flags, typically after consumers have reacted.
    pub fn reset_changes(&mut self) {
        self.current_state.preview_changed = false;
        self.current_state.validation_changed = false;
        self.current_state.execution_changed = false;
    }
}
