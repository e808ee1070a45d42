//! Settings-document handling.
//!
//! Both sync engines mutate exactly one field of the host agent's settings
//! JSON: `permissions.allow`, kept as a sorted, deduplicated string array.
//! The rest of the document is carried through untouched. Writes go through
//! a temp file in the target directory, are validated as JSON, and only then
//! renamed over the target, with the previous contents saved to a sibling
//! `.bak` file.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Settings root is not a JSON object")]
    NotAnObject,

    #[error("Refusing to replace settings with invalid JSON: {0}")]
    InvalidOutput(String),

    #[error("HOME environment variable not set")]
    HomeNotSet,
}

/// The user-global settings file: `~/.claude/settings.json`.
pub fn global_settings_path() -> Result<PathBuf, SettingsError> {
    let home = std::env::var("HOME").map_err(|_| SettingsError::HomeNotSet)?;
    Ok(PathBuf::from(home).join(".claude").join("settings.json"))
}

/// A worktree's project-local settings file.
pub fn worktree_local_path(worktree_root: &Path) -> PathBuf {
    worktree_root.join(".claude").join("settings.local.json")
}

/// Silent reader for sibling settings: the `permissions.allow` array, or
/// `None` when the file is missing, unreadable, or not shaped as expected.
pub fn read_allow_array(path: &Path) -> Option<Vec<String>> {
    let contents = fs::read_to_string(path).ok()?;
    let doc: Value = serde_json::from_str(&contents).ok()?;
    let allow = doc.get("permissions")?.get("allow")?.as_array()?;
    Some(
        allow
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

/// A settings document bound to its path.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    doc: Value,
}

impl SettingsFile {
    /// Load the document at `path`. A missing file loads as an empty object;
    /// a present-but-unparseable file is an error (the sync tools must not
    /// silently clobber a file a human may have half-edited).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();

        let doc = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let doc: Value = serde_json::from_str(&contents)?;
            if !doc.is_object() {
                return Err(SettingsError::NotAnObject);
            }
            doc
        } else {
            Value::Object(Map::new())
        };

        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current `permissions.allow` rules, in file order.
    pub fn allow_rules(&self) -> Vec<String> {
        self.doc
            .get("permissions")
            .and_then(|p| p.get("allow"))
            .and_then(Value::as_array)
            .map(|array| {
                array
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace `permissions.allow` with the given set, sorted. Every other
    /// field of the document is left alone.
    pub fn set_allow_rules(&mut self, rules: &BTreeSet<String>) {
        let array = Value::Array(rules.iter().map(|r| json!(r)).collect());

        if !self.doc.is_object() {
            self.doc = Value::Object(Map::new());
        }
        let Some(root) = self.doc.as_object_mut() else {
            return;
        };
        let permissions = root
            .entry("permissions")
            .or_insert_with(|| Value::Object(Map::new()));
        if !permissions.is_object() {
            *permissions = Value::Object(Map::new());
        }
        if let Some(map) = permissions.as_object_mut() {
            map.insert("allow".to_string(), array);
        }
    }

    /// Canonical serialization: pretty-printed with sorted object keys and a
    /// trailing newline. Writing the same document twice is byte-identical.
    pub fn render(&self) -> Result<String, SettingsError> {
        let mut contents = serde_json::to_string_pretty(&self.doc)?;
        contents.push('\n');
        Ok(contents)
    }

    /// Atomic replace: temp file in the same directory, JSON validation of
    /// what actually landed on disk, `.bak` of the previous contents, then
    /// rename. On validation failure the target is untouched and the temp
    /// file is removed.
    pub fn save(&self) -> Result<(), SettingsError> {
        let contents = self.render()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.flush()?;

        let written = fs::read_to_string(temp.path())?;
        if let Err(e) = serde_json::from_str::<Value>(&written) {
            // Dropping `temp` unlinks it.
            return Err(SettingsError::InvalidOutput(e.to_string()));
        }

        if self.path.exists() {
            fs::copy(&self.path, backup_path(&self.path))?;
        }

        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule_set(rules: &[&str]) -> BTreeSet<String> {
        rules.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = SettingsFile::load(temp_dir.path().join("settings.json")).unwrap();
        assert!(settings.allow_rules().is_empty());
    }

    #[test]
    fn test_set_and_save_allow_rules() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Bash(git status *)", "Bash(cargo check *)"]));
        settings.save().unwrap();

        let reloaded = SettingsFile::load(&path).unwrap();
        // Sorted array.
        assert_eq!(
            reloaded.allow_rules(),
            vec!["Bash(cargo check *)", "Bash(git status *)"]
        );
    }

    #[test]
    fn test_other_fields_survive_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"model":"opus","permissions":{"allow":["Read"],"deny":["Bash(rm *)"]},"hooks":{"PermissionRequest":[]}}"#,
        )
        .unwrap();

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Bash(git log *)"]));
        settings.save().unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["model"], "opus");
        assert_eq!(doc["permissions"]["deny"][0], "Bash(rm *)");
        assert!(doc["hooks"]["PermissionRequest"].is_array());
        assert_eq!(doc["permissions"]["allow"][0], "Bash(git log *)");
    }

    #[test]
    fn test_save_is_idempotent_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Bash(git status *)", "Read"]));
        settings.save().unwrap();
        let first = fs::read(&path).unwrap();

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Bash(git status *)", "Read"]));
        settings.save().unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_backup_created_on_replace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"permissions":{"allow":["Read"]}}"#).unwrap();
        let original = fs::read_to_string(&path).unwrap();

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Write"]));
        settings.save().unwrap();

        let backup = temp_dir.path().join("settings.json.bak");
        assert!(backup.exists());
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = SettingsFile::load(&path).unwrap();
        settings.set_allow_rules(&rule_set(&["Read"]));
        settings.save().unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["settings.json"]);
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{broken").unwrap();

        assert!(matches!(
            SettingsFile::load(&path),
            Err(SettingsError::ParseError(_))
        ));
    }

    #[test]
    fn test_non_object_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "[1,2,3]").unwrap();

        assert!(matches!(
            SettingsFile::load(&path),
            Err(SettingsError::NotAnObject)
        ));
    }

    #[test]
    fn test_read_allow_array_silent_failures() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.json");
        assert!(read_allow_array(&missing).is_none());

        let malformed = temp_dir.path().join("bad.json");
        fs::write(&malformed, "{oops").unwrap();
        assert!(read_allow_array(&malformed).is_none());

        let wrong_shape = temp_dir.path().join("shape.json");
        fs::write(&wrong_shape, r#"{"permissions":{"allow":"Read"}}"#).unwrap();
        assert!(read_allow_array(&wrong_shape).is_none());

        let good = temp_dir.path().join("good.json");
        fs::write(&good, r#"{"permissions":{"allow":["Read","Write"]}}"#).unwrap();
        assert_eq!(read_allow_array(&good).unwrap(), vec!["Read", "Write"]);
    }

    #[test]
    fn test_worktree_local_path() {
        let path = worktree_local_path(Path::new("/repos/feature"));
        assert_eq!(
            path,
            PathBuf::from("/repos/feature/.claude/settings.local.json")
        );
    }
}
