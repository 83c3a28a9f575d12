use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::controller::{advance_stage, fold_repository};
use crate::tools::ToolOutcome;

/// The six phases of the linear Git workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    Initialize,
    Explore,
    Modify,
    Verify,
    Commit,
    Push,
}

impl WorkflowStage {
    /// One fixed guidance line per stage, appended to the system prompt
    pub fn guidance(&self) -> &'static str {
        match self {
            WorkflowStage::Initialize => {
                "Start by cloning the repository the user wants to work on (git_clone)."
            }
            WorkflowStage::Explore => {
                "Explore the repository: list directories and read files to understand it, \
                 then make the requested changes with write_file."
            }
            WorkflowStage::Modify => {
                "You are editing files. Re-read what you changed or run git_status to \
                 verify the working tree before committing."
            }
            WorkflowStage::Verify => {
                "Verify the changes look correct, then commit them with a clear message \
                 (git_commit)."
            }
            WorkflowStage::Commit => {
                "Changes are committed. Push them to the remote (git_push) if the user \
                 wants them published."
            }
            WorkflowStage::Push => {
                "The work is pushed. Summarize what was done; no further tool use should \
                 be needed."
            }
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Initialize => "initialize",
            WorkflowStage::Explore => "explore",
            WorkflowStage::Modify => "modify",
            WorkflowStage::Verify => "verify",
            WorkflowStage::Commit => "commit",
            WorkflowStage::Push => "push",
        };
        f.write_str(name)
    }
}

/// Repository metadata accumulated over the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub url: Option<String>,
    pub directory: Option<String>,
    pub branch: Option<String>,
    pub files_modified: BTreeSet<String>,
}

impl RepositoryInfo {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.directory.is_none()
            && self.branch.is_none()
            && self.files_modified.is_empty()
    }

    /// Formatted summary for the system prompt
    pub fn to_prompt_context(&self) -> String {
        let mut context = String::from("Repository context:\n");
        if let Some(url) = &self.url {
            context.push_str(&format!("  url: {}\n", url));
        }
        if let Some(directory) = &self.directory {
            context.push_str(&format!("  directory: {}\n", directory));
        }
        if let Some(branch) = &self.branch {
            context.push_str(&format!("  branch: {}\n", branch));
        }
        if !self.files_modified.is_empty() {
            context.push_str("  modified files:\n");
            for file in &self.files_modified {
                context.push_str(&format!("    - {}\n", file));
            }
        }
        context
    }
}

/// Derive a local clone directory from a repository URL: the last path
/// segment with any `.git` suffix stripped, as a relative path.
///
/// Tool execution and the metadata fold both rely on this; they must agree.
pub fn derive_directory(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let after_slash = trimmed.rsplit('/').next().unwrap_or(trimmed);
    // scp-style remotes (git@host:org/repo.git) may carry a colon instead
    let last = after_slash.rsplit(':').next().unwrap_or(after_slash);
    let name = last.strip_suffix(".git").unwrap_or(last);
    format!("./{}", name)
}

/// The per-turn workflow value threaded through the Turn Loop.
/// Immutable: `apply_turn` returns the successor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub stage: WorkflowStage,
    pub repository: RepositoryInfo,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            stage: WorkflowStage::Initialize,
            repository: RepositoryInfo::default(),
        }
    }

    /// Fold one turn's tool outcomes into the successor state
    pub fn apply_turn(&self, outcomes: &[ToolOutcome]) -> Self {
        Self {
            stage: advance_stage(self.stage, outcomes),
            repository: fold_repository(&self.repository, outcomes),
        }
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stage_order_matches_workflow() {
        assert!(WorkflowStage::Initialize < WorkflowStage::Explore);
        assert!(WorkflowStage::Explore < WorkflowStage::Modify);
        assert!(WorkflowStage::Modify < WorkflowStage::Verify);
        assert!(WorkflowStage::Verify < WorkflowStage::Commit);
        assert!(WorkflowStage::Commit < WorkflowStage::Push);
    }

    #[test]
    fn derive_directory_strips_git_suffix() {
        assert_eq!(
            derive_directory("https://host/org/myrepo.git"),
            "./myrepo".to_string()
        );
    }

    #[test]
    fn derive_directory_is_deterministic() {
        let url = "https://host/org/myrepo.git";
        assert_eq!(derive_directory(url), derive_directory(url));
    }

    #[test]
    fn derive_directory_edge_cases() {
        assert_eq!(derive_directory("https://host/org/plain"), "./plain");
        assert_eq!(derive_directory("https://host/org/trailing/"), "./trailing");
        assert_eq!(derive_directory("git@host:org/repo.git"), "./repo");
        assert_eq!(derive_directory("git@host:repo.git"), "./repo");
    }

    #[test]
    fn prompt_context_lists_metadata() {
        let mut repo = RepositoryInfo::default();
        assert!(repo.is_empty());

        repo.url = Some("https://x/y/z.git".to_string());
        repo.branch = Some("main".to_string());
        repo.files_modified.insert("README.md".to_string());

        let context = repo.to_prompt_context();
        assert!(context.contains("url: https://x/y/z.git"));
        assert!(context.contains("branch: main"));
        assert!(context.contains("- README.md"));
    }
}
