// Test to ensure the curated safe lists are used consistently across modules

use gatecheck::security::tables::{
    BLOCKLISTED_BINARIES, SHELL_KEYWORDS, safe_subcommands,
};
use gatecheck::security::{classify, is_tracked_binary};
use serde_json::json;

const TRACKED_BINARIES: &[&str] = &[
    "git", "cargo", "npm", "nix", "docker", "kubectl", "pip", "brew",
];

#[test]
fn test_every_tracked_binary_has_a_nonempty_safe_list() {
    for binary in TRACKED_BINARIES {
        let subs = safe_subcommands(binary)
            .unwrap_or_else(|| panic!("missing safe list for {binary}"));
        assert!(!subs.is_empty(), "empty safe list for {binary}");
        assert!(is_tracked_binary(binary));
    }
}

#[test]
fn test_classifier_accepts_every_curated_subcommand() {
    for binary in TRACKED_BINARIES {
        for sub in safe_subcommands(binary).unwrap() {
            let command = format!("{binary} {sub}");
            let result = classify("Bash", &json!({ "command": command }));
            assert!(
                result.is_safe,
                "classifier rejected curated subcommand '{command}'"
            );
            assert_eq!(result.rule_string(), format!("Bash({binary} {sub} *)"));
        }
    }
}

#[test]
fn test_no_tracked_binary_is_blocklisted() {
    for binary in TRACKED_BINARIES {
        assert!(
            !BLOCKLISTED_BINARIES.contains(binary),
            "{binary} is both tracked and blocklisted"
        );
        assert!(
            !SHELL_KEYWORDS.contains(binary),
            "{binary} is both tracked and a shell keyword"
        );
    }
}

#[test]
fn test_safe_lists_contain_no_duplicates() {
    for binary in TRACKED_BINARIES {
        let subs = safe_subcommands(binary).unwrap();
        let mut deduped = subs.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), subs.len(), "duplicate entry for {binary}");
    }
}

#[test]
fn test_mutating_subcommands_stay_off_the_safe_lists() {
    let forbidden = [
        ("git", "push"),
        ("git", "config"),
        ("git", "stash"),
        ("git", "reset"),
        ("cargo", "build"),
        ("cargo", "test"),
        ("cargo", "publish"),
        ("npm", "test"),
        ("npm", "start"),
        ("npm", "audit"),
        ("nix", "eval"),
        ("nix", "develop"),
        ("docker", "run"),
        ("kubectl", "delete"),
        ("pip", "install"),
        ("brew", "install"),
    ];

    for (binary, sub) in forbidden {
        let subs = safe_subcommands(binary).unwrap();
        assert!(
            !subs.contains(&sub),
            "'{binary} {sub}' must not be on the safe list"
        );
    }
}

#[test]
fn test_refinement_expands_exactly_the_curated_subcommands() {
    use gatecheck::sync::refine_rules;
    use std::collections::BTreeSet;

    for binary in TRACKED_BINARIES {
        let broad: BTreeSet<String> = [format!("Bash({binary} *)")].into_iter().collect();
        let (refined, _) = refine_rules(&broad);

        for sub in safe_subcommands(binary).unwrap() {
            assert!(
                refined.contains(&format!("Bash({binary} {sub} *)")),
                "refinement lost '{binary} {sub}'"
            );
        }
        assert!(!refined.contains(&format!("Bash({binary} *)")));
    }
}
