//! Stage Controller: pure functions deciding stage transitions and folding
//! repository metadata from one turn's tool outcomes.
//!
//! Transitions gate on the triggering call having actually succeeded, so a
//! failing `git_clone` leaves the session in `initialize` and the model can
//! retry.

use tracing::warn;

use super::state::{derive_directory, RepositoryInfo, WorkflowStage};
use crate::tools::{ToolCall, ToolOutcome};

/// Advance the stage by at most one step, per the single permitted forward
/// edge of the current stage. Never regresses.
pub fn advance_stage(stage: WorkflowStage, outcomes: &[ToolOutcome]) -> WorkflowStage {
    let succeeded =
        |pred: fn(&ToolCall) -> bool| -> bool {
            outcomes.iter().any(|outcome| {
                outcome.result.is_success()
                    && outcome.call.as_ref().is_some_and(|call| pred(call))
            })
        };

    match stage {
        WorkflowStage::Initialize if succeeded(|c| matches!(c, ToolCall::GitClone { .. })) => {
            WorkflowStage::Explore
        }
        WorkflowStage::Explore if succeeded(|c| matches!(c, ToolCall::WriteFile { .. })) => {
            WorkflowStage::Modify
        }
        WorkflowStage::Modify
            if succeeded(|c| {
                matches!(c, ToolCall::GitStatus { .. } | ToolCall::ReadFile { .. })
            }) =>
        {
            WorkflowStage::Verify
        }
        WorkflowStage::Verify if succeeded(|c| matches!(c, ToolCall::GitCommit { .. })) => {
            WorkflowStage::Commit
        }
        WorkflowStage::Commit if succeeded(|c| matches!(c, ToolCall::GitPush { .. })) => {
            WorkflowStage::Push
        }
        other => other,
    }
}

/// Fold repository metadata from one turn's tool outcomes. Outcomes whose
/// arguments failed validation are skipped with a warning; failed calls
/// contribute nothing.
pub fn fold_repository(repo: &RepositoryInfo, outcomes: &[ToolOutcome]) -> RepositoryInfo {
    let mut next = repo.clone();

    for outcome in outcomes {
        let Some(call) = &outcome.call else {
            warn!(
                tool = %outcome.request.name,
                "skipping malformed tool arguments in metadata fold"
            );
            continue;
        };
        if !outcome.result.is_success() {
            continue;
        }

        match call {
            ToolCall::GitClone {
                repo_url,
                directory,
                branch,
            } => {
                next.url = Some(repo_url.clone());
                next.directory = Some(
                    directory
                        .clone()
                        .unwrap_or_else(|| derive_directory(repo_url)),
                );
                if let Some(branch) = branch {
                    next.branch = Some(branch.clone());
                }
            }
            ToolCall::GitCheckout { target, .. } => {
                next.branch = Some(target.clone());
            }
            ToolCall::WriteFile { file_path, .. } => {
                next.files_modified.insert(file_path.clone());
            }
            _ => {}
        }
    }

    next
}
