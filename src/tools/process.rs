use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::GIT_COMMAND_TIMEOUT_SECS;
use crate::tools::types::ActionResult;

/// Run the git binary with the given arguments and capture output
pub async fn run_git(args: &[&str], working_dir: Option<&Path>) -> ActionResult {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let timeout_duration = Duration::from_secs(GIT_COMMAND_TIMEOUT_SECS);

    match timeout(timeout_duration, run_command(cmd)).await {
        Ok(Ok((output, success))) => {
            if success {
                ActionResult::Success { output }
            } else {
                ActionResult::Error {
                    error: format!("git {} failed:\n{}", args.join(" "), output),
                }
            }
        }
        Ok(Err(e)) => ActionResult::Error {
            error: format!("git {} failed: {}", args.join(" "), e),
        },
        Err(_) => ActionResult::Error {
            error: format!(
                "git {} timed out after {} seconds",
                args.join(" "),
                timeout_duration.as_secs()
            ),
        },
    }
}

async fn drain_lines<R>(stream: R) -> std::io::Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    let mut text = String::new();
    while let Some(line) = lines.next_line().await? {
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}

/// Run the command and collect stdout and stderr into one transcript
async fn run_command(mut cmd: Command) -> Result<(String, bool)> {
    let mut child = cmd
        .spawn()
        .context("Failed to execute git. Is git installed and on PATH?")?;

    let stdout = child
        .stdout
        .take()
        .context("Git process stdout stream not available. This is likely a bug.")?;
    let stderr = child
        .stderr
        .take()
        .context("Git process stderr stream not available. This is likely a bug.")?;

    // Drain both pipes concurrently; if either fills while the other is
    // being read to EOF, the child blocks and the command never finishes.
    let (output, errors) = tokio::join!(drain_lines(stdout), drain_lines(stderr));
    let output = output
        .context("Error reading git output. The process may have terminated unexpectedly.")?;
    let errors = errors
        .context("Error reading git error output. The process may have terminated unexpectedly.")?;

    let status = child
        .wait()
        .await
        .context("Failed to wait for git to complete. Process may have crashed.")?;

    let mut full_output = output;
    if !errors.is_empty() {
        if !full_output.is_empty() {
            full_output.push_str("\n--- stderr ---\n");
        }
        full_output.push_str(&errors);
    }

    if !status.success() {
        full_output.push_str(&format!(
            "\n--- git exited with status: {} ---",
            status.code().unwrap_or(-1)
        ));
    }

    Ok((full_output, status.success()))
}
