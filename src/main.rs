//! The PermissionRequest hook binary.
//!
//! Reads one JSON envelope from stdin and either prints the allow envelope
//! or prints nothing (fall through to the interactive prompt). Exit status
//! is zero on every normal path; the host agent must never see a hook error
//! for a request it can simply re-ask a human about.

use std::io::Read;
use std::process;

use gatecheck::audit::ApprovalLog;
use gatecheck::hook::{Decision, DecisionEngine, ToolInvocation, allow_envelope};

fn main() {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        eprintln!("gatecheck: failed to read stdin: {e}");
        process::exit(1);
    }

    // Malformed input falls through silently, without a log record.
    let Some(invocation) = ToolInvocation::parse(&raw) else {
        return;
    };

    let log = match ApprovalLog::new() {
        Ok(log) => Some(log),
        Err(e) => {
            eprintln!("gatecheck: approval log unavailable: {e}");
            None
        }
    };

    let (auto_mode, worktree_mode) = DecisionEngine::modes_from_env();
    let engine = DecisionEngine::new(log, auto_mode, worktree_mode);

    if let Decision::Allow(_) = engine.decide(&invocation) {
        println!("{}", allow_envelope());
    }
}
