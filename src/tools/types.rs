use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::DEFAULT_REMOTE;

/// A raw tool invocation as requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back in the tool result message
    pub id: String,
    /// Tool name, e.g. "git_clone"
    pub name: String,
    /// Structured arguments as received from the wire
    pub arguments: serde_json::Value,
}

/// A validated, typed tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    /// Clone a repository, optionally into a named directory and branch
    GitClone {
        repo_url: String,
        #[serde(default)]
        directory: Option<String>,
        #[serde(default)]
        branch: Option<String>,
    },
    /// Check out a branch, tag, or commit
    GitCheckout {
        directory: String,
        target: String,
        #[serde(default)]
        create_branch: bool,
    },
    /// Show working tree status
    GitStatus {
        directory: String,
    },
    /// Commit changes
    GitCommit {
        directory: String,
        message: String,
        #[serde(default = "default_true")]
        add_all: bool,
    },
    /// Push to a remote
    GitPush {
        directory: String,
        #[serde(default = "default_remote")]
        remote: String,
        #[serde(default)]
        branch: Option<String>,
        #[serde(default)]
        set_upstream: bool,
    },
    /// Read a file
    ReadFile {
        file_path: String,
    },
    /// Write or create a file
    WriteFile {
        file_path: String,
        content: String,
    },
    /// List directory entries
    ListDirectory {
        directory: String,
    },
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

impl ToolCall {
    /// Validate a raw request against the tool schemas
    pub fn parse(request: &ToolCallRequest) -> Result<Self> {
        let tagged = json!({
            "name": request.name,
            "arguments": request.arguments,
        });
        serde_json::from_value(tagged)
            .with_context(|| format!("Invalid arguments for tool '{}'", request.name))
    }

    /// The wire name of this tool
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GitClone { .. } => "git_clone",
            ToolCall::GitCheckout { .. } => "git_checkout",
            ToolCall::GitStatus { .. } => "git_status",
            ToolCall::GitCommit { .. } => "git_commit",
            ToolCall::GitPush { .. } => "git_push",
            ToolCall::ReadFile { .. } => "read_file",
            ToolCall::WriteFile { .. } => "write_file",
            ToolCall::ListDirectory { .. } => "list_directory",
        }
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionResult {
    Success { output: String },
    Error { error: String },
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    /// The human-readable text the model sees, success or failure alike
    pub fn as_text(&self) -> &str {
        match self {
            ActionResult::Success { output } => output,
            ActionResult::Error { error } => error,
        }
    }
}

/// One tool call from a turn, with its validation and execution outcome.
/// `call` is `None` when the arguments failed validation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub request: ToolCallRequest,
    pub call: Option<ToolCall>,
    pub result: ActionResult,
}
