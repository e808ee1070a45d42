// Module errors must convert into AppError via From, and every error must
// render a human-readable message.

use gatecheck::error::{AppError, GitError};
use gatecheck::git::GitVersion;
use gatecheck::settings::SettingsError;
use std::io;

#[test]
fn test_git_error_into_app_error() {
    let err: AppError = GitError::NotARepository.into();
    assert!(matches!(err, AppError::Git(_)));
    assert!(err.to_string().contains("not inside a git worktree"));
}

#[test]
fn test_settings_error_into_app_error() {
    let err: AppError = SettingsError::NotAnObject.into();
    assert!(matches!(err, AppError::Settings(_)));
    assert!(err.to_string().contains("not a JSON object"));
}

#[test]
fn test_io_error_into_app_error() {
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    let err: AppError = io_err.into();
    assert!(matches!(err, AppError::Io(_)));
    assert!(err.to_string().contains("denied"));
}

#[test]
fn test_io_error_into_settings_error() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
    let err: SettingsError = io_err.into();
    assert!(matches!(err, SettingsError::ReadError(_)));
}

#[test]
fn test_json_error_into_app_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: AppError = json_err.into();
    assert!(matches!(err, AppError::Json(_)));
    assert!(err.to_string().contains("malformed JSON"));
}

#[test]
fn test_invalid_output_message_names_the_problem() {
    let err = SettingsError::InvalidOutput("unexpected end of input".to_string());
    let message = err.to_string();
    assert!(message.contains("Refusing to replace settings"));
    assert!(message.contains("unexpected end of input"));
}

#[test]
fn test_failed_query_message_names_the_query() {
    let err = GitError::QueryFailed {
        query: "worktree list --porcelain".to_string(),
        detail: "fatal: not a git repository".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("worktree list --porcelain"));
    assert!(message.contains("not a git repository"));
}

#[test]
fn test_version_gate_messages() {
    let err = GitError::WorktreeListingUnsupported(GitVersion { major: 2, minor: 6 });
    let message = err.to_string();
    assert!(message.contains("2.6"));
    assert!(message.contains("2.7 or newer"));

    let err = GitError::VersionUnreadable("mystery output".to_string());
    assert!(err.to_string().contains("mystery output"));
}
