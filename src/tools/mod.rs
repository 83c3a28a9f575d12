// Gateway module for tools - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod filesystem;
mod git;
mod process;
mod registry;
mod types;

// Public re-exports - the ONLY way to access tool functionality
pub use registry::{execute, execute_request, tool_definitions};
pub use types::{ActionResult, ToolCall, ToolCallRequest, ToolOutcome};
