// Gateway module for the workflow core - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod controller;
mod prompt;
mod state;

// Public re-exports - the ONLY way to access workflow functionality
pub use controller::{advance_stage, fold_repository};
pub use prompt::build_system_prompt;
pub use state::{derive_directory, RepositoryInfo, WorkflowStage, WorkflowState};
