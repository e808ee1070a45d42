//! Append-only JSONL log of every permission request the hook has seen.
//!
//! One JSON object per `\n`-terminated line, written with a single
//! append-mode write so concurrent hook processes interleave at line
//! granularity (records stay well under a kilobyte). Records are never
//! rewritten; readers skip structurally invalid lines, including any partial
//! line left by a killed writer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::security::ClassificationResult;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Environment override for the log location.
pub const LOG_PATH_ENV: &str = "CLAUDE_PERMISSION_LOG";

/// One permission request, as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// UTC, RFC 3339, second precision.
    pub timestamp: String,
    pub tool: String,
    pub rule: String,
    pub base_command: String,
    /// Space-joined wrapper names, outermost first; empty when none.
    pub indirection_chain: String,
    /// The literal strings `"true"` / `"false"`.
    pub is_safe: String,
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Full command verbatim, kept for forensics rather than dedup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_rule: Option<String>,
}

impl LogRecord {
    /// Build a record from a classification outcome.
    pub fn from_classification(
        tool: &str,
        result: &ClassificationResult,
        cwd: &str,
        session_id: &str,
        exact_rule: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            tool: tool.to_string(),
            rule: result.rule_string(),
            base_command: result.base_command.clone(),
            indirection_chain: result.chain.join(" "),
            is_safe: if result.is_safe { "true" } else { "false" }.to_string(),
            cwd: cwd.to_string(),
            session_id: (!session_id.is_empty()).then(|| session_id.to_string()),
            exact_rule,
        }
    }
}

/// Handle on the approval log file.
pub struct ApprovalLog {
    log_path: PathBuf,
}

impl ApprovalLog {
    /// Open the log at its configured location: `$CLAUDE_PERMISSION_LOG`,
    /// falling back to `~/.claude/permission-approvals.jsonl`.
    pub fn new() -> std::io::Result<Self> {
        let log_path = match std::env::var(LOG_PATH_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::default_log_path()?,
        };
        Self::with_path(log_path)
    }

    /// Open the log at an explicit path.
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Default log path: ~/.claude/permission-approvals.jsonl
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".claude")
            .join("permission-approvals.jsonl"))
    }

    /// Append one record as a single JSONL line.
    pub fn append(&self, record: &LogRecord) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let mut line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        // One write for the whole line keeps concurrent appends line-atomic.
        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Read every structurally valid record. A missing file reads as empty.
    pub fn records(&self) -> std::io::Result<Vec<LogRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.log_path)?;
        Ok(contents
            .lines()
            .filter_map(|line| serde_json::from_str::<LogRecord>(line).ok())
            .collect())
    }

    /// Whether any prior record carries exactly this rule string. Log lines
    /// are parsed as JSON and compared field-wise, so a rule embedded inside
    /// another record's strings cannot false-match.
    pub fn contains_rule(&self, rule: &str) -> std::io::Result<bool> {
        Ok(self.records()?.iter().any(|record| record.rule == rule))
    }

    /// Rotate by rename once the file exceeds `MAX_LOG_SIZE`. The log is
    /// never compacted in place.
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = self.log_path.with_extension("jsonl.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
