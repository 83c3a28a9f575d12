use anyhow::{Context, Result};
use git2::{Repository, StatusOptions};
use std::fs;
use std::path::Path;

use super::process::run_git;
use super::types::ActionResult;
use crate::constants::{FALLBACK_SIGNATURE_EMAIL, FALLBACK_SIGNATURE_NAME};
use crate::workflow::derive_directory;

/// Clone a repository, optionally into an explicit directory and branch.
/// The target directory falls back to the derivation shared with the
/// metadata fold.
pub async fn clone_repo(
    repo_url: &str,
    directory: Option<&str>,
    branch: Option<&str>,
) -> ActionResult {
    let dir = directory
        .map(str::to_string)
        .unwrap_or_else(|| derive_directory(repo_url));

    if let Some(parent) = Path::new(&dir).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                return ActionResult::Error {
                    error: format!("Failed to create directory {}: {}", parent.display(), e),
                };
            }
        }
    }

    let cloned = run_git(&["clone", repo_url, dir.as_str()], None).await;
    let ActionResult::Success { output } = cloned else {
        return cloned;
    };

    let mut summary = format!("Cloned {} into {}\n{}", repo_url, dir, output);

    if let Some(branch) = branch {
        match run_git(&["checkout", branch], Some(Path::new(&dir))).await {
            ActionResult::Success { output } => {
                summary.push_str(&format!("Checked out {}\n{}", branch, output));
            }
            error => return error,
        }
    }

    ActionResult::Success { output: summary }
}

/// Check out a branch, tag, or commit, optionally creating the branch
pub async fn checkout(directory: &str, target: &str, create_branch: bool) -> ActionResult {
    let args: Vec<&str> = if create_branch {
        vec!["checkout", "-b", target]
    } else {
        vec!["checkout", target]
    };
    match run_git(&args, Some(Path::new(directory))).await {
        ActionResult::Success { output } => ActionResult::Success {
            output: format!("Checked out {}\n{}", target, output),
        },
        error => error,
    }
}

/// Push to a remote; the branch defaults to the current HEAD
pub async fn push(
    directory: &str,
    remote: &str,
    branch: Option<&str>,
    set_upstream: bool,
) -> ActionResult {
    let branch = match branch {
        Some(branch) => branch.to_string(),
        None => match current_branch(directory) {
            Ok(branch) => branch,
            Err(e) => {
                return ActionResult::Error {
                    error: format!("Cannot resolve current branch in {}: {}", directory, e),
                }
            }
        },
    };

    let mut args = vec!["push"];
    if set_upstream {
        args.push("-u");
    }
    args.push(remote);
    args.push(branch.as_str());

    run_git(&args, Some(Path::new(directory))).await
}

/// Get git status for a repository
pub fn status(directory: &str) -> Result<String> {
    let repo = Repository::open(directory)
        .with_context(|| format!("Failed to open git repository at {}. Is this a git repo?", directory))?;

    let mut status_options = StatusOptions::new();
    status_options.include_untracked(true);
    status_options.include_ignored(false);

    let statuses = repo.statuses(Some(&mut status_options))?;

    let mut output = String::new();
    output.push_str("Git Status:\n");
    output.push_str("-----------\n");

    let mut has_changes = false;

    for entry in statuses.iter() {
        let status = entry.status();
        let path = entry.path().unwrap_or("<unknown>");

        let status_str = if status.is_wt_new() {
            format!("  new file: {}", path)
        } else if status.is_wt_modified() {
            format!("  modified: {}", path)
        } else if status.is_wt_deleted() {
            format!("  deleted:  {}", path)
        } else if status.is_wt_renamed() {
            format!("  renamed:  {}", path)
        } else if status.is_index_new()
            || status.is_index_modified()
            || status.is_index_deleted()
        {
            format!("  staged:   {}", path)
        } else if status.is_conflicted() {
            format!("  conflict: {}", path)
        } else {
            continue;
        };

        output.push_str(&status_str);
        output.push('\n');
        has_changes = true;
    }

    if !has_changes {
        output.push_str("  (working directory clean)\n");
    }

    if let Ok(head) = repo.head() {
        if let Some(name) = head.shorthand() {
            output.push_str(&format!("\nOn branch: {}\n", name));
        }
    }

    Ok(output)
}

/// Commit changes with a message, optionally staging everything first
pub fn commit(directory: &str, message: &str, add_all: bool) -> Result<()> {
    let repo = Repository::open(directory)
        .with_context(|| format!("Failed to open git repository at {}. Is this a git repo?", directory))?;

    let mut index = repo.index()?;

    if add_all {
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
    }

    index.write()?;

    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    // First commit has no parent
    let parent_commit = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };

    let signature = repo
        .signature()
        .or_else(|_| git2::Signature::now(FALLBACK_SIGNATURE_NAME, FALLBACK_SIGNATURE_EMAIL))?;

    if let Some(parent) = parent_commit.as_ref() {
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[parent])?;
    } else {
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[])?;
    }

    Ok(())
}

/// Name of the branch HEAD currently points at
pub fn current_branch(directory: &str) -> Result<String> {
    let repo = Repository::open(directory)
        .with_context(|| format!("Failed to open git repository at {}. Is this a git repo?", directory))?;

    let head = repo.head().context("Repository has no commits yet")?;
    head.shorthand()
        .map(str::to_string)
        .context("HEAD is not on a named branch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();
        temp_dir
    }

    #[test]
    fn status_and_commit_cycle() {
        let temp_dir = init_repo();
        let dir = temp_dir.path().to_str().unwrap().to_string();

        fs::write(temp_dir.path().join("test.txt"), "Hello, Git!").unwrap();

        let status_before = status(&dir).unwrap();
        assert!(status_before.contains("new file"));

        commit(&dir, "Initial commit", true).unwrap();

        let status_after = status(&dir).unwrap();
        assert!(status_after.contains("working directory clean"));

        let branch = current_branch(&dir).unwrap();
        assert!(branch == "main" || branch == "master");
    }

    #[test]
    fn current_branch_fails_before_first_commit() {
        let temp_dir = init_repo();
        let dir = temp_dir.path().to_str().unwrap();
        assert!(current_branch(dir).is_err());
    }

    #[tokio::test]
    async fn checkout_creates_branch() {
        let temp_dir = init_repo();
        let dir = temp_dir.path().to_str().unwrap().to_string();

        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        commit(&dir, "base", true).unwrap();

        let result = checkout(&dir, "feature/test", true).await;
        assert!(result.is_success(), "checkout failed: {:?}", result);
        assert_eq!(current_branch(&dir).unwrap(), "feature/test");
    }

    #[tokio::test]
    async fn clone_rejects_unreachable_remote() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("cloned");
        let result = clone_repo(
            "file:///definitely/not/a/repo",
            Some(target.to_str().unwrap()),
            None,
        )
        .await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn push_without_branch_needs_a_head() {
        let temp_dir = init_repo();
        let dir = temp_dir.path().to_str().unwrap();

        // No commits yet: branch resolution fails before git even runs.
        let result = push(dir, "origin", None, false).await;
        match result {
            ActionResult::Error { error } => {
                assert!(error.contains("Cannot resolve current branch"));
            }
            ActionResult::Success { output } => panic!("expected error, got: {}", output),
        }
    }
}
