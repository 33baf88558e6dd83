//! Version-control collaborator.
//!
//! Merged-environment selection needs to know which local branches are
//! already merged into a base branch. Uses the system `git` binary.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::process::Command;

/// Fetch the latest refs from `origin`.
pub async fn fetch_origin(repo: &Path) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["fetch", "origin"])
        .output()
        .await
        .context("Failed to execute git fetch")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git fetch failed: {}", stderr.trim());
    }

    Ok(())
}

/// List the branches already merged into `base`.
pub async fn merged_branches(repo: &Path, base: &str) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["branch", "--no-color", "--merged", base])
        .output()
        .await
        .context("Failed to execute git branch")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git branch --merged failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8(output.stdout).context("Git output is not valid UTF-8")?;
    Ok(parse_branch_list(&stdout))
}

/// Parse `git branch` output: one branch per line, current branch marked
/// with `*`, worktree checkouts with `+`, detached HEAD lines skipped.
fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("* ")
                .trim_start_matches("+ ")
                .trim()
        })
        .filter(|branch| !branch.is_empty() && !branch.starts_with('('))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_listing() {
        let output = "  feature-a\n* main\n  feature-b\n";
        assert_eq!(
            parse_branch_list(output),
            vec!["feature-a", "main", "feature-b"]
        );
    }

    #[test]
    fn skips_detached_head_marker() {
        let output = "* (HEAD detached at 1a2b3c4)\n  main\n";
        assert_eq!(parse_branch_list(output), vec!["main"]);
    }

    #[test]
    fn handles_empty_output() {
        assert!(parse_branch_list("").is_empty());
    }
}
