//! The shared spine of the two sync tools.
//!
//! Both do the same thing with different sources and targets: collect rules,
//! merge them into a settings document's `permissions.allow`, and write the
//! document back atomically. Sorting and dedup live in the `BTreeSet`; the
//! canonical serializer lives in [`crate::settings`]. Running the same sync
//! twice therefore leaves the target byte-identical after the first run.

pub mod harvest;
pub mod refine;

pub use harvest::{
    accepted_rule_shape, harvest_log_rules, harvest_log_rules_for_worktrees,
    harvest_worktree_rules,
};
pub use refine::{RefineReport, refine_rules, refine_with_log};

use std::collections::BTreeSet;
use std::path::Path;

use crate::settings::{SettingsError, SettingsFile};

/// What applying a rule set to a settings file changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub total: usize,
}

impl SyncChanges {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Delta between a current rule list and a target set.
pub fn diff_rules(current: &BTreeSet<String>, target: &BTreeSet<String>) -> SyncChanges {
    SyncChanges {
        added: target.difference(current).cloned().collect(),
        removed: current.difference(target).cloned().collect(),
        total: target.len(),
    }
}

/// Replace `permissions.allow` in the file at `path` with `target`,
/// reporting the delta. The write is atomic with a `.bak` of the previous
/// contents.
pub fn apply_rules(path: &Path, target: &BTreeSet<String>) -> Result<SyncChanges, SettingsError> {
    let mut settings = SettingsFile::load(path)?;
    let current: BTreeSet<String> = settings.allow_rules().into_iter().collect();
    let changes = diff_rules(&current, target);

    settings.set_allow_rules(target);
    settings.save()?;

    Ok(changes)
}
