//! Version gate for worktree enumeration.
//!
//! `git worktree list --porcelain` appeared in 2.7. The aggregate CLI checks
//! once up front so an old installation gets a clear message instead of a
//! confusing porcelain parse failure halfway through.

use std::path::Path;

use crate::error::{GitError, GitResult};
use crate::git::query::git_query;

/// First release able to list worktrees in porcelain format.
const WORKTREE_PORCELAIN_SINCE: (u32, u32) = (2, 7);

/// A git release, to the granularity the gate cares about. Patch levels
/// never change porcelain support, so they are not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
}

impl GitVersion {
    /// Ask the installed git for its version banner.
    pub fn installed() -> GitResult<Self> {
        let banner = git_query(Path::new("."), &["--version"])?;
        Self::from_banner(&banner)
    }

    /// Read a `git --version` banner, e.g. `git version 2.39.2`. Platform
    /// builds append suffixes (`2.47.1.windows.2`); anything past
    /// major.minor is ignored.
    pub fn from_banner(banner: &str) -> GitResult<Self> {
        let unreadable = || GitError::VersionUnreadable(banner.trim().to_string());

        let numbers = banner
            .split_whitespace()
            .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
            .ok_or_else(unreadable)?;

        let mut fields = numbers.split('.').map(|field| field.parse::<u32>().ok());
        match (fields.next().flatten(), fields.next().flatten()) {
            (Some(major), Some(minor)) => Ok(Self { major, minor }),
            _ => Err(unreadable()),
        }
    }

    pub fn supports_worktree_listing(self) -> bool {
        (self.major, self.minor) >= WORKTREE_PORCELAIN_SINCE
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Fail fast when the installed git cannot enumerate worktrees.
pub fn ensure_worktree_support() -> GitResult<GitVersion> {
    let version = GitVersion::installed()?;
    if !version.supports_worktree_listing() {
        return Err(GitError::WorktreeListingUnsupported(version));
    }
    Ok(version)
}
