//! Refinement: trading broad binary rules for safe-subcommand expansions.
//!
//! `Bash(git *)` allows everything git can do; refinement replaces it with
//! one rule per curated safe subcommand, plus the alternate-prefix forms
//! (`Bash(git -C * status *)`). Anything that would widen access instead of
//! narrowing it is only reported, never added.

use std::collections::BTreeSet;

use crate::audit::LogRecord;
use crate::security::tables::{alt_rule_prefixes, is_tracked_binary, safe_subcommands};

/// What a refinement pass did and what it declined to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefineReport {
    /// Broad rules that were replaced by expansions.
    pub expanded: Vec<String>,
    /// Base commands seen in the log whose subcommand is not on the safe
    /// list. Allowing these takes a human.
    pub unsafe_observed: Vec<String>,
    /// Rules whose requests arrived through indirection wrappers. Also
    /// human opt-in.
    pub indirect_observed: Vec<String>,
}

/// The binary of a broad `Bash(<binary> *)` rule, if that is the shape.
fn broad_bash_binary(rule: &str) -> Option<&str> {
    let inner = rule.strip_prefix("Bash(")?.strip_suffix(" *)")?;
    (!inner.is_empty() && !inner.contains(' ')).then_some(inner)
}

/// Expand every broad rule over a tracked binary; pass everything else
/// through unchanged. Returns the refined set and the broad rules replaced.
pub fn refine_rules(rules: &BTreeSet<String>) -> (BTreeSet<String>, Vec<String>) {
    let mut refined = BTreeSet::new();
    let mut expanded = Vec::new();

    for rule in rules {
        let binary = match broad_bash_binary(rule) {
            Some(binary) if is_tracked_binary(binary) => binary,
            _ => {
                refined.insert(rule.clone());
                continue;
            }
        };

        expanded.push(rule.clone());
        if let Some(subs) = safe_subcommands(binary) {
            for sub in subs {
                refined.insert(format!("Bash({binary} {sub} *)"));
                for prefix in alt_rule_prefixes(binary) {
                    refined.insert(format!("Bash({binary} {prefix} {sub} *)"));
                }
            }
        }
    }

    (refined, expanded)
}

/// Full refinement pass with the informational half of the report drawn
/// from log records.
pub fn refine_with_log(
    rules: &BTreeSet<String>,
    records: &[LogRecord],
) -> (BTreeSet<String>, RefineReport) {
    let (refined, expanded) = refine_rules(rules);

    let mut unsafe_observed = BTreeSet::new();
    let mut indirect_observed = BTreeSet::new();
    for record in records {
        if let Some((binary, sub)) = record.base_command.split_once(' ') {
            let not_safe =
                safe_subcommands(binary).is_some_and(|subs| !subs.contains(&sub));
            if not_safe {
                unsafe_observed.insert(record.base_command.clone());
            }
        }
        if !record.indirection_chain.is_empty() {
            indirect_observed.insert(record.rule.clone());
        }
    }

    let report = RefineReport {
        expanded,
        unsafe_observed: unsafe_observed.into_iter().collect(),
        indirect_observed: indirect_observed.into_iter().collect(),
    };
    (refined, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_set(rules: &[&str]) -> BTreeSet<String> {
        rules.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_broad_rule_detection() {
        assert_eq!(broad_bash_binary("Bash(git *)"), Some("git"));
        assert_eq!(broad_bash_binary("Bash(jq *)"), Some("jq"));
        assert_eq!(broad_bash_binary("Bash(git status *)"), None);
        assert_eq!(broad_bash_binary("Bash"), None);
        assert_eq!(broad_bash_binary("Read"), None);
    }

    #[test]
    fn test_refine_expands_tracked_broad_rule() {
        let (refined, expanded) = refine_rules(&rule_set(&["Bash(git *)"]));

        assert_eq!(expanded, vec!["Bash(git *)"]);
        assert!(!refined.contains("Bash(git *)"));
        assert!(refined.contains("Bash(git status *)"));
        assert!(refined.contains("Bash(git log *)"));
        assert!(refined.contains("Bash(git diff *)"));
        assert!(refined.contains("Bash(git -C * status *)"));
        assert!(refined.contains("Bash(git -C * rev-parse *)"));
        // Unsafe subcommands never appear.
        assert!(!refined.contains("Bash(git push *)"));
        assert!(!refined.contains("Bash(git config *)"));

        // Every safe subcommand is present in both forms.
        let subs = safe_subcommands("git").unwrap();
        assert_eq!(refined.len(), subs.len() * 2);
    }

    #[test]
    fn test_refine_leaves_untracked_broad_rule() {
        let (refined, expanded) = refine_rules(&rule_set(&["Bash(jq *)"]));
        assert!(expanded.is_empty());
        assert_eq!(refined, rule_set(&["Bash(jq *)"]));
    }

    #[test]
    fn test_refine_passes_through_fine_grained_rules() {
        let input = rule_set(&["Bash(git push *)", "Read", "WebFetch(domain:a.dev)"]);
        let (refined, expanded) = refine_rules(&input);
        assert!(expanded.is_empty());
        assert_eq!(refined, input);
    }

    #[test]
    fn test_refine_is_idempotent() {
        let (first, _) = refine_rules(&rule_set(&["Bash(cargo *)", "Read"]));
        let (second, expanded) = refine_rules(&first);
        assert_eq!(first, second);
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_report_collects_unsafe_and_indirect() {
        let push = crate::security::classify("Bash", &json!({"command": "git push origin"}));
        let push_record = LogRecord::from_classification("Bash", &push, "/r", "", None);

        let wrapped =
            crate::security::classify("Bash", &json!({"command": "sudo git status"}));
        let wrapped_record = LogRecord::from_classification("Bash", &wrapped, "/r", "", None);

        let plain = crate::security::classify("Bash", &json!({"command": "git status"}));
        let plain_record = LogRecord::from_classification("Bash", &plain, "/r", "", None);

        let (_, report) = refine_with_log(
            &rule_set(&["Bash(git *)"]),
            &[push_record, wrapped_record, plain_record],
        );

        assert_eq!(report.expanded, vec!["Bash(git *)"]);
        assert_eq!(report.unsafe_observed, vec!["git push"]);
        assert_eq!(report.indirect_observed, vec!["Bash(git status *)"]);
    }
}
