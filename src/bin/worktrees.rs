//! `gatecheck-worktrees`: merge allowlists across sibling worktrees.
//!
//! Sibling checkouts of one repository accumulate approvals independently;
//! this tool unions their project-local `permissions.allow` arrays (and,
//! with `--from-log`, rules harvested from the approval log for those
//! worktrees) and writes the merged set back to one or all of them.

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use gatecheck::audit::ApprovalLog;
use gatecheck::error::AppResult;
use gatecheck::git::version::ensure_worktree_support;
use gatecheck::git::worktree::{WorktreeInfo, current_worktree_root, discover_worktrees};
use gatecheck::sync::{
    apply_rules, diff_rules, harvest_log_rules_for_worktrees, harvest_worktree_rules,
    refine_with_log,
};

#[derive(Parser)]
#[command(
    name = "gatecheck-worktrees",
    about = "Merge permission allowlists across sibling git worktrees"
)]
struct Cli {
    /// Show the merged allowlist without writing anything (default)
    #[arg(long)]
    preview: bool,

    /// Write the merged allowlist to the current worktree
    #[arg(long)]
    apply: bool,

    /// Write the merged allowlist to every worktree
    #[arg(long)]
    apply_all: bool,

    /// Per-worktree summary: rule counts and what each checkout is missing
    #[arg(long)]
    report: bool,

    /// Show per-worktree additions the merge would make
    #[arg(long)]
    diff: bool,

    /// Replace broad binary rules with safe-subcommand expansions
    #[arg(long)]
    refine: bool,

    /// Also harvest log records whose cwd falls inside a worktree
    #[arg(long)]
    from_log: bool,

    /// Approval log to harvest with --from-log (defaults to $CLAUDE_PERMISSION_LOG)
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Preview,
    Apply,
    ApplyAll,
    Report,
    Diff,
}

impl Cli {
    fn mode(&self) -> Option<Mode> {
        let picked = [
            (self.preview, Mode::Preview),
            (self.apply, Mode::Apply),
            (self.apply_all, Mode::ApplyAll),
            (self.report, Mode::Report),
            (self.diff, Mode::Diff),
        ];
        let mut modes = picked.iter().filter(|(flag, _)| *flag);
        match (modes.next(), modes.next()) {
            (None, _) => Some(Mode::Preview),
            (Some((_, mode)), None) => Some(*mode),
            _ => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let Some(mode) = cli.mode() else {
        eprintln!(
            "gatecheck-worktrees: --preview, --apply, --apply-all, --report and --diff \
             are mutually exclusive"
        );
        process::exit(1);
    };

    if let Err(e) = ensure_worktree_support() {
        eprintln!("gatecheck-worktrees: {e}");
        process::exit(1);
    }

    if let Err(e) = run(&cli, mode) {
        eprintln!("gatecheck-worktrees: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli, mode: Mode) -> AppResult<()> {
    let cwd = env::current_dir()?;
    let worktrees = discover_worktrees(&cwd)?;
    if worktrees.is_empty() {
        eprintln!("gatecheck-worktrees: no worktrees found here");
        process::exit(1);
    }

    let mut merged: BTreeSet<String> = harvest_worktree_rules(&worktrees);

    let mut records = Vec::new();
    if cli.from_log {
        let log = match &cli.log {
            Some(path) => ApprovalLog::with_path(path)?,
            None => ApprovalLog::new()?,
        };
        records = log.records()?;
        merged.extend(harvest_log_rules_for_worktrees(&records, &worktrees));
    }

    if cli.refine {
        let (refined, report) = refine_with_log(&merged, &records);
        merged = refined;
        for rule in &report.expanded {
            eprintln!("refined: {rule} expanded to its safe subcommands");
        }
        for base in &report.unsafe_observed {
            eprintln!("observed but not added (unsafe subcommand): {base}");
        }
        for rule in &report.indirect_observed {
            eprintln!("observed but not added (reached through wrappers): {rule}");
        }
    }

    match mode {
        Mode::Preview => {
            for rule in &merged {
                println!("{rule}");
            }
            eprintln!(
                "{} rules across {} worktrees; rerun with --apply or --apply-all to write",
                merged.len(),
                worktrees.len()
            );
        }
        Mode::Report => {
            for worktree in &worktrees {
                let own: BTreeSet<String> = worktree.allow_rules().into_iter().collect();
                let missing = diff_rules(&own, &merged);
                println!(
                    "{}: {} rules, {} missing",
                    worktree.path.display(),
                    own.len(),
                    missing.added.len()
                );
                for rule in &missing.added {
                    println!("  + {rule}");
                }
            }
        }
        Mode::Diff => {
            for worktree in &worktrees {
                let own: BTreeSet<String> = worktree.allow_rules().into_iter().collect();
                let changes = diff_rules(&own, &merged);
                if changes.is_noop() {
                    continue;
                }
                println!("{}:", worktree.path.display());
                for rule in &changes.added {
                    println!("+ {rule}");
                }
            }
        }
        Mode::Apply => {
            let root = current_worktree_root(&cwd).ok_or_else(|| {
                gatecheck::error::GitError::NotARepository
            })?;
            let target = find_worktree(&worktrees, &root).unwrap_or(WorktreeInfo { path: root });
            write_worktree(&target, &merged)?;
        }
        Mode::ApplyAll => {
            for worktree in &worktrees {
                write_worktree(worktree, &merged)?;
            }
        }
    }

    Ok(())
}

fn find_worktree(worktrees: &[WorktreeInfo], root: &PathBuf) -> Option<WorktreeInfo> {
    worktrees
        .iter()
        .find(|wt| {
            wt.path
                .canonicalize()
                .map(|c| &c == root)
                .unwrap_or(wt.path == *root)
        })
        .cloned()
}

fn write_worktree(worktree: &WorktreeInfo, merged: &BTreeSet<String>) -> AppResult<()> {
    let path = worktree.settings_path();
    let changes = apply_rules(&path, merged)?;
    eprintln!(
        "wrote {} rules to {} ({} added)",
        changes.total,
        path.display(),
        changes.added.len()
    );
    Ok(())
}
