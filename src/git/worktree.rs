//! Sibling-worktree discovery and per-worktree rule sets.
//!
//! Worktrees are found through `git worktree list --porcelain`. Because the
//! hook runs on every tool request, a fast guard short-circuits the common
//! single-worktree case without paying for the full listing: when the git-dir
//! equals the git-common-dir and the common dir has no populated `worktrees/`
//! subdirectory, there are no siblings.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GitResult;
use crate::git::query::git_query;
use crate::settings;

/// A single worktree of the surrounding repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
}

impl WorktreeInfo {
    /// Project-local settings file for this worktree.
    pub fn settings_path(&self) -> PathBuf {
        settings::worktree_local_path(&self.path)
    }

    /// The worktree's `permissions.allow` rules. Missing or malformed
    /// settings files read as empty; a broken sibling never blocks the hook.
    pub fn allow_rules(&self) -> Vec<String> {
        settings::read_allow_array(&self.settings_path()).unwrap_or_default()
    }
}

/// One record of `git worktree list --porcelain` output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorktreeEntry {
    path: PathBuf,
    bare: bool,
}

/// Parse `git worktree list --porcelain` output. Records are attribute lines
/// separated by blank lines; only `worktree` and `bare` matter here.
fn parse_worktree_list(output: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(WorktreeEntry {
                path: PathBuf::from(path),
                bare: false,
            });
        } else if line == "bare" {
            if let Some(entry) = current.as_mut() {
                entry.bare = true;
            }
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    entries
}

/// Fast sibling check. Returns false outside a repository.
pub fn has_sibling_worktrees(cwd: &Path) -> bool {
    let Ok(output) = git_query(cwd, &["rev-parse", "--git-dir", "--git-common-dir"]) else {
        return false;
    };

    let mut lines = output.lines();
    let (Some(git_dir), Some(common_dir)) = (lines.next(), lines.next()) else {
        return false;
    };
    let git_dir = resolve_dir(cwd, git_dir);
    let common_dir = resolve_dir(cwd, common_dir);

    // A linked worktree's private git-dir lives under the common dir; the
    // main worktree has the two equal.
    if git_dir != common_dir {
        return true;
    }

    match fs::read_dir(common_dir.join("worktrees")) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

/// All worktrees of the repository containing `cwd`, bare repositories and
/// vanished checkouts filtered out.
pub fn discover_worktrees(cwd: &Path) -> GitResult<Vec<WorktreeInfo>> {
    let output = git_query(cwd, &["worktree", "list", "--porcelain"])?;

    Ok(parse_worktree_list(&output)
        .into_iter()
        .filter(|entry| !entry.bare && entry.path.exists())
        .map(|entry| WorktreeInfo { path: entry.path })
        .collect())
}

/// Root of the worktree containing `cwd`, canonicalized.
pub fn current_worktree_root(cwd: &Path) -> Option<PathBuf> {
    let output = git_query(cwd, &["rev-parse", "--show-toplevel"]).ok()?;
    let root = PathBuf::from(output.trim());
    Some(root.canonicalize().unwrap_or(root))
}

/// Union of the `permissions.allow` arrays of every sibling worktree
/// (the worktree containing `cwd` excluded). Empty when `cwd` is not in a
/// repository or the repository has a single worktree.
pub fn sibling_allow_rules(cwd: &Path) -> Vec<String> {
    if !has_sibling_worktrees(cwd) {
        return Vec::new();
    }

    let current = current_worktree_root(cwd);
    let worktrees = match discover_worktrees(cwd) {
        Ok(list) => list,
        Err(_) => return Vec::new(),
    };

    let mut rules = BTreeSet::new();
    for worktree in worktrees {
        let canonical = worktree
            .path
            .canonicalize()
            .unwrap_or_else(|_| worktree.path.clone());
        if current.as_deref() == Some(canonical.as_path()) {
            continue;
        }
        rules.extend(worktree.allow_rules());
    }

    rules.into_iter().collect()
}

fn resolve_dir(cwd: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    absolute.canonicalize().unwrap_or(absolute)
}
