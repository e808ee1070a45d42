//! The per-request decision cascade.
//!
//! Strict order: intrinsic safety, then sibling-worktree match, then
//! log-history match, then fall-through. The safe-subcommand path is the one
//! source of approval that does not depend on history, so it always goes
//! first. On any internal inconsistency the engine falls through to the
//! interactive prompt; it never defaults to allow.

use std::env;
use std::path::PathBuf;

use crate::audit::{ApprovalLog, LogRecord};
use crate::git::worktree;
use crate::hook::protocol::ToolInvocation;
use crate::security::classify;

/// Enable approval on a log-history match.
pub const AUTO_MODE_ENV: &str = "CLAUDE_PERMISSION_AUTO";
/// Enable approval on a sibling-worktree allowlist match.
pub const WORKTREE_MODE_ENV: &str = "CLAUDE_PERMISSION_WORKTREE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    SafeSubcommand,
    SiblingWorktree,
    LogHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    FallThrough,
}

/// One engine per hook invocation; the log handle is explicit, never global.
pub struct DecisionEngine {
    log: Option<ApprovalLog>,
    auto_mode: bool,
    worktree_mode: bool,
}

impl DecisionEngine {
    pub fn new(log: Option<ApprovalLog>, auto_mode: bool, worktree_mode: bool) -> Self {
        Self {
            log,
            auto_mode,
            worktree_mode,
        }
    }

    /// Mode flags from the environment (`"1"` enables).
    pub fn modes_from_env() -> (bool, bool) {
        let enabled = |name: &str| env::var(name).is_ok_and(|v| v == "1");
        (enabled(AUTO_MODE_ENV), enabled(WORKTREE_MODE_ENV))
    }

    pub fn decide(&self, invocation: &ToolInvocation) -> Decision {
        if invocation.tool_name.is_empty() {
            return Decision::FallThrough;
        }

        let result = classify(&invocation.tool_name, &invocation.tool_input);
        let rule = result.rule_string();

        // The history probe reads prior records, so it runs before this
        // request's own record lands in the log.
        let rule_seen_before = self.auto_mode
            && self
                .log
                .as_ref()
                .and_then(|log| log.contains_rule(&rule).ok())
                .unwrap_or(false);

        let record = LogRecord::from_classification(
            &invocation.tool_name,
            &result,
            &invocation.cwd,
            &invocation.session_id,
            invocation.bash_command().map(str::to_string),
        );
        let append_ok = match &self.log {
            Some(log) => match log.append(&record) {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("gatecheck: failed to append approval log: {e}");
                    false
                }
            },
            None => false,
        };

        if result.is_safe {
            return Decision::Allow(AllowReason::SafeSubcommand);
        }

        if self.worktree_mode {
            if let Some(cwd) = self.effective_cwd(invocation) {
                if worktree::sibling_allow_rules(&cwd).iter().any(|r| r == &rule) {
                    return Decision::Allow(AllowReason::SiblingWorktree);
                }
            }
        }

        // A failed append also disables the history path for this request.
        if self.auto_mode && append_ok && rule_seen_before {
            return Decision::Allow(AllowReason::LogHistory);
        }

        Decision::FallThrough
    }

    fn effective_cwd(&self, invocation: &ToolInvocation) -> Option<PathBuf> {
        if !invocation.cwd.is_empty() {
            return Some(PathBuf::from(&invocation.cwd));
        }
        env::current_dir().ok()
    }
}
