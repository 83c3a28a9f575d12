use anyhow::Result;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::filesystem;
use super::git;
use super::types::{ActionResult, ToolCall, ToolCallRequest, ToolOutcome};

/// OpenAI-format function schemas for the full tool set. The model is
/// prompted and bound against these shapes, so they must stay stable.
static TOOL_DEFINITIONS: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![
        function_schema(
            "git_clone",
            "Clone a git repository into a local directory",
            json!({
                "type": "object",
                "properties": {
                    "repo_url": { "type": "string", "description": "URL of the repository to clone" },
                    "directory": { "type": "string", "description": "Target directory (defaults to the repository name)" },
                    "branch": { "type": "string", "description": "Branch to check out after cloning" }
                },
                "required": ["repo_url"]
            }),
        ),
        function_schema(
            "git_checkout",
            "Check out a branch, tag, or commit in a repository",
            json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Repository directory" },
                    "target": { "type": "string", "description": "Branch, tag, or commit to check out" },
                    "create_branch": { "type": "boolean", "description": "Create the branch first (default false)" }
                },
                "required": ["directory", "target"]
            }),
        ),
        function_schema(
            "git_status",
            "Show the working tree status of a repository",
            json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Repository directory" }
                },
                "required": ["directory"]
            }),
        ),
        function_schema(
            "git_commit",
            "Commit changes in a repository",
            json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Repository directory" },
                    "message": { "type": "string", "description": "Commit message" },
                    "add_all": { "type": "boolean", "description": "Stage all changes first (default true)" }
                },
                "required": ["directory", "message"]
            }),
        ),
        function_schema(
            "git_push",
            "Push commits to a remote",
            json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Repository directory" },
                    "remote": { "type": "string", "description": "Remote name (default origin)" },
                    "branch": { "type": "string", "description": "Branch to push (defaults to the current branch)" },
                    "set_upstream": { "type": "boolean", "description": "Set the upstream while pushing (default false)" }
                },
                "required": ["directory"]
            }),
        ),
        function_schema(
            "read_file",
            "Read a file and return its contents",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path of the file to read" }
                },
                "required": ["file_path"]
            }),
        ),
        function_schema(
            "write_file",
            "Write content to a file, creating parent directories as needed",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path of the file to write" },
                    "content": { "type": "string", "description": "Full new content of the file" }
                },
                "required": ["file_path", "content"]
            }),
        ),
        function_schema(
            "list_directory",
            "List the entries of a directory, one name per line",
            json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Directory to list" }
                },
                "required": ["directory"]
            }),
        ),
    ]
});

fn function_schema(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    })
}

/// The schemas sent to the model with every request
pub fn tool_definitions() -> &'static [Value] {
    &TOOL_DEFINITIONS
}

/// Execute a validated tool call. Failures are converted to error text at
/// this boundary and never propagate further.
pub async fn execute(call: &ToolCall) -> ActionResult {
    match call {
        ToolCall::GitClone {
            repo_url,
            directory,
            branch,
        } => git::clone_repo(repo_url, directory.as_deref(), branch.as_deref()).await,
        ToolCall::GitCheckout {
            directory,
            target,
            create_branch,
        } => git::checkout(directory, target, *create_branch).await,
        ToolCall::GitStatus { directory } => from_result(git::status(directory)),
        ToolCall::GitCommit {
            directory,
            message,
            add_all,
        } => from_result(
            git::commit(directory, message, *add_all)
                .map(|_| format!("Committed with message: {}", message)),
        ),
        ToolCall::GitPush {
            directory,
            remote,
            branch,
            set_upstream,
        } => git::push(directory, remote, branch.as_deref(), *set_upstream).await,
        ToolCall::ReadFile { file_path } => from_result(filesystem::read_file(file_path)),
        ToolCall::WriteFile { file_path, content } => from_result(
            filesystem::write_file(file_path, content).map(|_| format!("File written: {}", file_path)),
        ),
        ToolCall::ListDirectory { directory } => from_result(filesystem::list_directory(directory)),
    }
}

/// Validate and execute one raw request, recording the full outcome
pub async fn execute_request(request: &ToolCallRequest) -> ToolOutcome {
    match ToolCall::parse(request) {
        Ok(call) => {
            debug!(tool = %call.name(), "executing tool call");
            let result = execute(&call).await;
            if !result.is_success() {
                warn!(tool = %call.name(), "tool call failed: {}", result.as_text());
            }
            ToolOutcome {
                request: request.clone(),
                call: Some(call),
                result,
            }
        }
        Err(e) => {
            warn!(tool = %request.name, "rejecting tool call: {:#}", e);
            ToolOutcome {
                request: request.clone(),
                call: None,
                result: ActionResult::Error {
                    error: format!("{:#}", e),
                },
            }
        }
    }
}

fn from_result(result: Result<String>) -> ActionResult {
    match result {
        Ok(output) => ActionResult::Success { output },
        Err(e) => ActionResult::Error {
            error: format!("{:#}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definitions_cover_the_full_tool_set() {
        let names: Vec<&str> = tool_definitions()
            .iter()
            .map(|def| def["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "git_clone",
                "git_checkout",
                "git_status",
                "git_commit",
                "git_push",
                "read_file",
                "write_file",
                "list_directory"
            ]
        );
        for def in tool_definitions() {
            assert_eq!(def["function"]["parameters"]["type"], "object");
        }
    }

    #[tokio::test]
    async fn invalid_arguments_yield_error_outcome() {
        let request = ToolCallRequest {
            id: "call_1".to_string(),
            name: "git_clone".to_string(),
            arguments: json!({"wrong_key": true}),
        };
        let outcome = execute_request(&request).await;
        assert!(outcome.call.is_none());
        assert!(!outcome.result.is_success());
        assert!(outcome.result.as_text().contains("git_clone"));
    }

    #[tokio::test]
    async fn status_on_non_repo_returns_error_text() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let call = ToolCall::GitStatus {
            directory: temp_dir.path().to_str().unwrap().to_string(),
        };
        let result = execute(&call).await;
        assert!(!result.is_success());
        assert!(result.as_text().contains("Failed to open git repository"));
    }
}
