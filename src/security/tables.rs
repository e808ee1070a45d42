//! Static lookup tables consumed by the peeler and the classifier.
//!
//! All tables are immutable data. Extending the safe-subcommand list or the
//! indirection table must not require touching any other module; adding an
//! entry here is the whole change.

/// How an indirection wrapper consumes the tokens that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndirectionKind {
    /// Wrapper followed by ordinary flags, then the wrapped command
    /// (`sudo`, `nice`, `nohup`, `time`, `command`).
    PrefixFlags,
    /// Like `PrefixFlags`, but also consumes `KEY=VAL` assignment tokens (`env`).
    PrefixKv,
    /// Shell invoked with `-c '<command>'`; the quoted payload becomes the
    /// effective command (`bash`, `sh`, `zsh`, `dash`).
    ShellC,
    /// `xargs`, with its own argument-consuming flag table.
    Xargs,
}

/// Look up whether a leading token is a known indirection wrapper.
pub fn indirection_kind(word: &str) -> Option<IndirectionKind> {
    match word {
        "sudo" | "nice" | "nohup" | "time" | "command" => Some(IndirectionKind::PrefixFlags),
        "env" => Some(IndirectionKind::PrefixKv),
        "xargs" => Some(IndirectionKind::Xargs),
        "bash" | "sh" | "zsh" | "dash" => Some(IndirectionKind::ShellC),
        _ => None,
    }
}

/// Flags of an indirection wrapper that consume the following token as an
/// argument. Flags written as `--key=value` are self-contained and never
/// listed here.
pub fn flags_with_args(wrapper: &str) -> &'static [&'static str] {
    match wrapper {
        "sudo" => &["-u", "-g", "-U", "-h", "-p"],
        "nice" => &["-n"],
        "time" => &["-f", "-o"],
        "env" => &["-C", "-S", "-u", "--chdir", "--unset", "--split-string"],
        "xargs" => &[
            "-I", "-L", "-n", "-P", "-d", "-E", "-s", "-a", "--max-args", "--max-procs",
            "--max-lines", "--delimiter", "--arg-file",
        ],
        _ => &[],
    }
}

/// Shell reserved words. A residual command whose first token is one of these
/// is not a binary at all and collapses to the bare `Bash` rule.
pub const SHELL_KEYWORDS: &[&str] = &[
    "for", "if", "then", "else", "elif", "fi", "while", "until", "do", "done", "case", "esac",
    "select", "in", "function", "time", "coproc", "{", "}", "!", "[[", "]]",
];

/// Interpreters and shell builtins that can execute arbitrary code. Matched on
/// the bare name and on the basename of an absolute path.
pub const BLOCKLISTED_BINARIES: &[&str] = &[
    "bash", "sh", "zsh", "dash", "ksh", "csh", "tcsh", "fish", "python", "python2", "python3",
    "ruby", "perl", "node", "eval", "exec", "source",
];

pub fn is_shell_keyword(word: &str) -> bool {
    SHELL_KEYWORDS.contains(&word)
}

/// Blocklist check: the bare name, or the basename when the token looks like
/// a path (`/usr/bin/python3` is as blocked as `python3`).
pub fn is_blocklisted_binary(binary: &str) -> bool {
    if BLOCKLISTED_BINARIES.contains(&binary) {
        return true;
    }
    match binary.rsplit('/').next() {
        Some(base) => BLOCKLISTED_BINARIES.contains(&base),
        None => false,
    }
}

/// Curated read-only subcommand allowlists, one per tracked binary.
///
/// A subcommand belongs here only when, by documented behavior, it cannot
/// execute arbitrary code, modify the filesystem beyond its documented
/// read-only scope, or alter configuration that affects future invocations.
/// Adding a new subcommand requires careful security review.
pub fn safe_subcommands(binary: &str) -> Option<&'static [&'static str]> {
    match binary {
        // `config` and `stash` are deliberately absent: config can install
        // hook paths or trojan aliases, stash mutates the working tree.
        "git" => Some(&[
            "status", "log", "diff", "show", "branch", "tag", "describe", "rev-parse", "remote",
            "ls-files", "ls-tree", "cat-file", "shortlog", "reflog", "blame", "version", "help",
        ]),
        // `build`, `test`, `bench`, `doc` run build scripts / doc-tests.
        "cargo" => Some(&[
            "check", "clippy", "fmt", "metadata", "tree", "read-manifest", "pkgid",
            "verify-project", "version",
        ]),
        // `test`, `start`, `audit` run package scripts.
        "npm" => Some(&[
            "ls", "list", "outdated", "view", "info", "pack", "config", "prefix", "root",
        ]),
        // `eval`, `build`, `develop`, `shell`, `flake` evaluate arbitrary Nix code.
        "nix" => Some(&["log", "show-derivation", "path-info", "store"]),
        "docker" => Some(&[
            "ps", "images", "inspect", "logs", "stats", "top", "version", "info", "events",
            "history", "port",
        ]),
        "kubectl" => Some(&[
            "get", "describe", "logs", "top", "version", "cluster-info", "api-resources",
            "api-versions", "explain",
        ]),
        "pip" => Some(&["list", "show", "freeze", "check"]),
        "brew" => Some(&["list", "info", "search", "outdated", "deps", "leaves", "config"]),
        _ => None,
    }
}

pub fn is_tracked_binary(binary: &str) -> bool {
    safe_subcommands(binary).is_some()
}

pub fn is_safe_subcommand(binary: &str, subcommand: &str) -> bool {
    safe_subcommands(binary).is_some_and(|subs| subs.contains(&subcommand))
}

/// Flags with arguments that a binary accepts between its own name and the
/// subcommand (`git -C <path> status`). The classifier skips over these when
/// extracting the subcommand. Every flag listed here consumes one argument.
pub fn pre_subcommand_flags(binary: &str) -> &'static [&'static str] {
    match binary {
        "git" => &["-C", "--git-dir", "-c", "--work-tree"],
        "docker" => &["--context", "-H", "--host", "-l", "--log-level"],
        "kubectl" => &["--context", "--kubeconfig", "-n", "--namespace", "-s", "--server"],
        _ => &[],
    }
}

/// Flag prefixes that imply an alternate rule form during refinement. For
/// each safe subcommand `sub` of `git`, refinement emits both
/// `Bash(git sub *)` and `Bash(git -C * sub *)`.
pub fn alt_rule_prefixes(binary: &str) -> &'static [&'static str] {
    match binary {
        "git" => &["-C *"],
        _ => &[],
    }
}
