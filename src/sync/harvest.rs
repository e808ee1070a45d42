//! Extracting candidate allowlist rules from the approval log and from
//! sibling settings files.

use std::collections::BTreeSet;
use std::path::Path;

use crate::audit::LogRecord;
use crate::git::worktree::WorktreeInfo;
use crate::security::tables::is_blocklisted_binary;

/// Whether a rule string matches the allowlist shape grammar.
///
/// Accepted: `Bash(...)` whose leading token is not a blocklisted
/// interpreter, the bare file tools, `WebFetch` with or without a domain,
/// and `mcp__*` names. The bare `Bash` rule is rejected; persisting it would
/// allowlist every shell command.
pub fn accepted_rule_shape(rule: &str) -> bool {
    if let Some(inner) = rule.strip_prefix("Bash(").and_then(|r| r.strip_suffix(')')) {
        let Some(binary) = inner.split_whitespace().next() else {
            return false;
        };
        // A leading wildcard is as broad as bare `Bash`.
        return binary != "*" && !is_blocklisted_binary(binary);
    }

    matches!(rule, "Read" | "Write" | "Edit" | "MultiEdit" | "WebFetch")
        || (rule.starts_with("WebFetch(") && rule.ends_with(')'))
        || rule.starts_with("mcp__")
}

/// Deduplicated rules from the log, shape-filtered.
pub fn harvest_log_rules(records: &[LogRecord]) -> BTreeSet<String> {
    records
        .iter()
        .map(|record| record.rule.clone())
        .filter(|rule| accepted_rule_shape(rule))
        .collect()
}

/// Like [`harvest_log_rules`], but keeps only records whose cwd falls under
/// one of the given worktrees. Used by the aggregate tool's `--from-log`.
pub fn harvest_log_rules_for_worktrees(
    records: &[LogRecord],
    worktrees: &[WorktreeInfo],
) -> BTreeSet<String> {
    let filtered: Vec<LogRecord> = records
        .iter()
        .filter(|record| {
            !record.cwd.is_empty()
                && worktrees
                    .iter()
                    .any(|wt| Path::new(&record.cwd).starts_with(&wt.path))
        })
        .cloned()
        .collect();
    harvest_log_rules(&filtered)
}

/// Union of the `permissions.allow` arrays of the given worktrees.
pub fn harvest_worktree_rules(worktrees: &[WorktreeInfo]) -> BTreeSet<String> {
    worktrees
        .iter()
        .flat_map(|wt| wt.allow_rules())
        .collect()
}
