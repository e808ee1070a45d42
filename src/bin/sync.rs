//! `gatecheck-sync`: fold the approval log into the user-global allowlist.
//!
//! Harvests rules from the JSONL log, merges them with the current
//! `permissions.allow` of `~/.claude/settings.json`, optionally refines
//! broad rules into safe-subcommand expansions, and writes the result back
//! atomically. Without `--apply` nothing is written.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use gatecheck::audit::ApprovalLog;
use gatecheck::error::AppResult;
use gatecheck::settings::{SettingsFile, global_settings_path};
use gatecheck::sync::{
    RefineReport, apply_rules, diff_rules, harvest_log_rules, refine_with_log,
};

#[derive(Parser)]
#[command(
    name = "gatecheck-sync",
    about = "Synchronize the permission-approval log into the global allowlist"
)]
struct Cli {
    /// Show the resulting allowlist without writing anything (default)
    #[arg(long)]
    preview: bool,

    /// Write the target settings file
    #[arg(long)]
    apply: bool,

    /// Print the deduplicated harvested rules, one per line
    #[arg(long)]
    print: bool,

    /// Show what would change against the current allowlist
    #[arg(long)]
    diff: bool,

    /// Replace broad binary rules with safe-subcommand expansions
    #[arg(long)]
    refine: bool,

    /// Approval log to harvest (defaults to $CLAUDE_PERMISSION_LOG)
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Settings file to write (defaults to ~/.claude/settings.json)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Preview,
    Apply,
    Print,
    Diff,
}

impl Cli {
    fn mode(&self) -> Option<Mode> {
        let picked = [
            (self.preview, Mode::Preview),
            (self.apply, Mode::Apply),
            (self.print, Mode::Print),
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
        eprintln!("gatecheck-sync: --preview, --apply, --print and --diff are mutually exclusive");
        process::exit(1);
    };

    if let Err(e) = run(&cli, mode) {
        eprintln!("gatecheck-sync: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli, mode: Mode) -> AppResult<()> {
    let log = match &cli.log {
        Some(path) => ApprovalLog::with_path(path)?,
        None => ApprovalLog::new()?,
    };
    let records = log.records()?;
    let harvested = harvest_log_rules(&records);

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => global_settings_path().map_err(gatecheck::error::AppError::Settings)?,
    };
    let settings = SettingsFile::load(&settings_path)?;
    let current: BTreeSet<String> = settings.allow_rules().into_iter().collect();

    let mut target: BTreeSet<String> = current.union(&harvested).cloned().collect();
    let mut report = None;
    if cli.refine {
        let (refined, refine_report) = refine_with_log(&target, &records);
        target = refined;
        report = Some(refine_report);
    }

    match mode {
        Mode::Print => {
            let printable = if cli.refine {
                let (refined, _) = gatecheck::sync::refine_rules(&harvested);
                refined
            } else {
                harvested
            };
            for rule in &printable {
                println!("{rule}");
            }
        }
        Mode::Diff => {
            let changes = diff_rules(&current, &target);
            for rule in &changes.added {
                println!("+ {rule}");
            }
            for rule in &changes.removed {
                println!("- {rule}");
            }
        }
        Mode::Preview => {
            let changes = diff_rules(&current, &target);
            for rule in &target {
                println!("{rule}");
            }
            eprintln!(
                "{} rules ({} new, {} dropped); rerun with --apply to write {}",
                changes.total,
                changes.added.len(),
                changes.removed.len(),
                settings_path.display()
            );
        }
        Mode::Apply => {
            let changes = apply_rules(&settings_path, &target)?;
            eprintln!(
                "wrote {} rules to {} ({} added, {} removed)",
                changes.total,
                settings_path.display(),
                changes.added.len(),
                changes.removed.len()
            );
        }
    }

    if let Some(report) = report {
        print_refine_report(&report);
    }

    Ok(())
}

fn print_refine_report(report: &RefineReport) {
    for rule in &report.expanded {
        eprintln!("refined: {rule} expanded to its safe subcommands");
    }
    if !report.unsafe_observed.is_empty() {
        eprintln!("observed but not added (unsafe subcommands):");
        for base in &report.unsafe_observed {
            eprintln!("  {base}");
        }
    }
    if !report.indirect_observed.is_empty() {
        eprintln!("observed but not added (reached through wrappers):");
        for rule in &report.indirect_observed {
            eprintln!("  {rule}");
        }
    }
}
