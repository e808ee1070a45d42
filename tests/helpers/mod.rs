use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to create a test git repository with one commit
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    Command::new("git")
        .args(["init"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to init git repo");

    Command::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.name");

    Command::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.email");

    fs::write(repo_path.join("README.md"), "test repo").expect("Failed to write file");
    Command::new("git")
        .args(["add", "README.md"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to add file");
    Command::new("git")
        .args(["commit", "-m", "initial"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to commit");

    (temp_dir, repo_path)
}

/// Helper to add a linked worktree next to the repository
pub fn add_worktree(repo_path: &Path, name: &str) -> PathBuf {
    let worktree_path = repo_path.parent().unwrap().join(name);

    Command::new("git")
        .args([
            "worktree",
            "add",
            worktree_path.to_str().unwrap(),
            "-b",
            name,
        ])
        .current_dir(repo_path)
        .output()
        .expect("Failed to add worktree");

    worktree_path
}

/// Helper to write a worktree-local settings file with an allow array
pub fn write_allow_rules(worktree_path: &Path, rules: &[&str]) {
    let claude_dir = worktree_path.join(".claude");
    fs::create_dir_all(&claude_dir).expect("Failed to create .claude dir");

    let doc = serde_json::json!({ "permissions": { "allow": rules } });
    fs::write(
        claude_dir.join("settings.local.json"),
        serde_json::to_string_pretty(&doc).unwrap(),
    )
    .expect("Failed to write settings.local.json");
}
