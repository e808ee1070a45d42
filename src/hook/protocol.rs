//! The stdin/stdout JSON contract with the host agent.
//!
//! Stdin carries one envelope per invocation; unknown fields are ignored.
//! Stdout is either empty (fall through to the interactive prompt) or the
//! fixed allow envelope. Nothing else is ever printed there.

use serde::Deserialize;
use serde_json::{Value, json};

/// The parsed stdin envelope. Every field tolerates absence so a sparse or
/// partially-populated request still classifies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInvocation {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub session_id: String,
}

impl ToolInvocation {
    /// Parse a raw stdin payload. `None` means malformed input, which the
    /// hook treats exactly like an empty tool name: silent fall-through,
    /// no log record.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// The Bash command string, when this is a Bash invocation carrying one.
    pub fn bash_command(&self) -> Option<&str> {
        if self.tool_name != "Bash" {
            return None;
        }
        self.tool_input.get("command").and_then(Value::as_str)
    }
}

/// The one-and-only allow response.
pub fn allow_envelope() -> Value {
    json!({
        "hookSpecificOutput": {
            "hookEventName": "PermissionRequest",
            "decision": { "behavior": "allow" }
        }
    })
}
