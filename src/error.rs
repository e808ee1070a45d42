use std::io;
use thiserror::Error;

use crate::git::version::GitVersion;
use crate::settings::SettingsError;

/// Failures from the git layer backing worktree discovery.
///
/// Discovery treats most of these as "no siblings here" and moves on; only
/// the CLI tools surface them to a user.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("could not spawn git: {0}")]
    Unavailable(String),

    #[error("`git {query}` exited with an error: {detail}")]
    QueryFailed { query: String, detail: String },

    #[error("could not make sense of `git --version` output: {0:?}")]
    VersionUnreadable(String),

    #[error("installed git {0} cannot enumerate worktrees (2.7 or newer required)")]
    WorktreeListingUnsupported(GitVersion),

    #[error("not inside a git worktree")]
    NotARepository,
}

/// Umbrella error for the CLI binaries.
///
/// The hook never reports through this type; it swallows anything
/// recoverable and falls through to the interactive prompt instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GitResult<T> = std::result::Result<T, GitError>;

pub type AppResult<T> = std::result::Result<T, AppError>;
