//! Spawning git for the handful of read-only queries discovery needs.
//!
//! Nothing in this crate mutates a repository. Every caller passes a fixed
//! argument list (`rev-parse ...`, `worktree list --porcelain`), so there is
//! no command string to parse and no shell anywhere near the invocation.

use std::path::Path;
use std::process::Command;

use crate::error::{GitError, GitResult};

/// Run one git query in `dir` and hand back its stdout.
///
/// A non-zero exit becomes [`GitError::QueryFailed`] carrying the query and
/// whatever git said on stderr; callers that treat "not a repository" as a
/// normal answer just discard the error.
pub fn git_query(dir: &Path, args: &[&str]) -> GitResult<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| GitError::Unavailable(e.to_string()))?;

    if !output.status.success() {
        return Err(GitError::QueryFailed {
            query: args.join(" "),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) {
        Command::new("git")
            .args(["init"])
            .current_dir(dir)
            .output()
            .unwrap();
    }

    #[test]
    fn test_query_captures_stdout() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path());

        let out = git_query(temp_dir.path(), &["rev-parse", "--is-inside-work-tree"]).unwrap();
        assert_eq!(out.trim(), "true");
    }

    #[test]
    fn test_failed_query_carries_query_and_stderr() {
        let temp_dir = TempDir::new().unwrap();

        let err = git_query(temp_dir.path(), &["rev-parse", "--show-toplevel"]).unwrap_err();
        match err {
            GitError::QueryFailed { query, detail } => {
                assert_eq!(query, "rev-parse --show-toplevel");
                assert!(detail.contains("not a git repository"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_version_banner_works_outside_any_repo() {
        let temp_dir = TempDir::new().unwrap();

        let out = git_query(temp_dir.path(), &["--version"]).unwrap();
        assert!(out.starts_with("git version"));
    }

    #[test]
    fn test_multi_line_output_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path());

        let out = git_query(
            temp_dir.path(),
            &["rev-parse", "--git-dir", "--git-common-dir"],
        )
        .unwrap();
        assert_eq!(out.lines().count(), 2);
    }
}
