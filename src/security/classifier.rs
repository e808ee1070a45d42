//! Turns a tool invocation into a canonical permission rule plus an
//! intrinsic-safety verdict.
//!
//! The classifier never fails: malformed input collapses to the bare
//! tool-name rule with `is_safe` false, and the interactive prompt takes it
//! from there.

use serde_json::Value;

use crate::security::peeler::peel;
use crate::security::tables::{
    is_blocklisted_binary, is_safe_subcommand, is_shell_keyword, is_tracked_binary,
    pre_subcommand_flags,
};

/// Canonical permission-rule shapes.
///
/// Rules are compared as byte strings once rendered; the enum exists so the
/// synthesizer and the refiner never juggle half-formed strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// `Bash(<binary> <subcommand> *)` for a tracked binary with a subcommand.
    BashSubcommand { binary: String, subcommand: String },
    /// `Bash(<binary> *)` for any other plausible binary.
    BashBinary { binary: String },
    /// Bare `Bash` for unparseable, blocklisted, or keyword-led commands.
    BashAll,
    /// `WebFetch(domain:<host>)`, or bare `WebFetch` when no URL was given.
    WebFetch { domain: Option<String> },
    /// The tool name verbatim (file tools, `mcp__*` tools, anything else).
    Tool(String),
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::BashSubcommand { binary, subcommand } => {
                write!(f, "Bash({binary} {subcommand} *)")
            }
            Rule::BashBinary { binary } => write!(f, "Bash({binary} *)"),
            Rule::BashAll => write!(f, "Bash"),
            Rule::WebFetch { domain: Some(host) } => write!(f, "WebFetch(domain:{host})"),
            Rule::WebFetch { domain: None } => write!(f, "WebFetch"),
            Rule::Tool(name) => write!(f, "{name}"),
        }
    }
}

/// What the synthesizer hands back for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub rule: Rule,
    /// `<binary> <subcommand>`, `<binary>`, or empty.
    pub base_command: String,
    /// Indirection wrappers peeled off, outermost first.
    pub chain: Vec<String>,
    /// True only for a single-line command whose tracked binary ran a safe
    /// subcommand with no guard fired.
    pub is_safe: bool,
}

impl ClassificationResult {
    fn unsafe_rule(rule: Rule) -> Self {
        Self {
            rule,
            base_command: String::new(),
            chain: Vec::new(),
            is_safe: false,
        }
    }

    /// The rendered rule string, as logged and as matched against allowlists.
    pub fn rule_string(&self) -> String {
        self.rule.to_string()
    }
}

/// Classify a tool invocation by name and structured input.
pub fn classify(tool_name: &str, tool_input: &Value) -> ClassificationResult {
    match tool_name {
        "Bash" => {
            let command = tool_input
                .get("command")
                .and_then(Value::as_str)
                .unwrap_or("");
            classify_bash(command)
        }
        "Read" | "Write" | "Edit" | "MultiEdit" => {
            // File paths are deliberately not encoded; the rule vocabulary
            // stays coarse-grained for file tools.
            ClassificationResult::unsafe_rule(Rule::Tool(tool_name.to_string()))
        }
        "WebFetch" => {
            let domain = tool_input
                .get("url")
                .and_then(Value::as_str)
                .map(extract_domain);
            ClassificationResult::unsafe_rule(Rule::WebFetch { domain })
        }
        other => ClassificationResult::unsafe_rule(Rule::Tool(other.to_string())),
    }
}

/// The Bash pipeline: guards, peel, split, emit.
fn classify_bash(command: &str) -> ClassificationResult {
    if command.trim().is_empty() {
        return ClassificationResult::unsafe_rule(Rule::BashAll);
    }

    let multiline = command.contains('\n');
    let first_line = command.split('\n').next().unwrap_or("");

    let guard_fired = has_chaining(first_line)
        || has_substitution(first_line)
        || has_redirection(first_line)
        || has_background(first_line);

    let peeled = peel(first_line);
    let tokens: Vec<&str> = peeled.residual.split_whitespace().collect();

    let binary = tokens
        .first()
        .copied()
        .filter(|tok| is_plausible_binary(tok))
        .unwrap_or("");

    if binary.is_empty() {
        return ClassificationResult {
            rule: Rule::BashAll,
            base_command: String::new(),
            chain: peeled.chain,
            is_safe: false,
        };
    }

    let subcommand = extract_subcommand(binary, &tokens);

    if is_tracked_binary(binary) && !subcommand.is_empty() {
        let is_safe = !guard_fired && !multiline && is_safe_subcommand(binary, subcommand);
        return ClassificationResult {
            rule: Rule::BashSubcommand {
                binary: binary.to_string(),
                subcommand: subcommand.to_string(),
            },
            base_command: format!("{binary} {subcommand}"),
            chain: peeled.chain,
            is_safe,
        };
    }

    ClassificationResult {
        rule: Rule::BashBinary {
            binary: binary.to_string(),
        },
        base_command: binary.to_string(),
        chain: peeled.chain,
        is_safe: false,
    }
}

/// Advance past pre-subcommand flags (each consumes one argument) and return
/// the next token, or empty when the command stops at the binary.
fn extract_subcommand<'a>(binary: &str, tokens: &[&'a str]) -> &'a str {
    let skippable = pre_subcommand_flags(binary);
    let mut idx = 1;
    while idx < tokens.len() {
        let tok = tokens[idx];
        if skippable.contains(&tok) {
            idx += 2;
            continue;
        }
        // `--git-dir=/x` style: self-contained form of a listed flag.
        if skippable
            .iter()
            .any(|flag| tok.starts_with(&format!("{flag}=")))
        {
            idx += 1;
            continue;
        }
        break;
    }
    tokens.get(idx).copied().unwrap_or("")
}

/// A binary token must be a bare word or path: letters, digits, and `_.~/-`.
/// Keywords and blocklisted interpreters are rejected outright.
fn is_plausible_binary(token: &str) -> bool {
    let well_formed = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '~' | '/' | '-'));
    well_formed && !is_shell_keyword(token) && !is_blocklisted_binary(token)
}

/// Host portion of a URL: text after the first `://` (or the whole string if
/// there is none), cut at the next `/`.
fn extract_domain(url: &str) -> String {
    let after_scheme = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    };
    after_scheme
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Command chaining: `&&`, `||`, `|`, `;`.
pub fn has_chaining(line: &str) -> bool {
    ["&&", "||", "|", ";"].iter().any(|op| line.contains(op))
}

/// Command and process substitution: backtick, `$(`, `>(`, `<(`.
pub fn has_substitution(line: &str) -> bool {
    ["`", "$(", ">(", "<("].iter().any(|op| line.contains(op))
}

/// Redirection: the multi-character operators, plus any `>` or `<` that is
/// not the opening of a process substitution (which the substitution guard
/// already covers).
pub fn has_redirection(line: &str) -> bool {
    if [">>", "&>", "<<<", "2>"].iter().any(|op| line.contains(op)) {
        return true;
    }
    let bytes = line.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'>' || *byte == b'<' {
            if bytes.get(idx + 1) == Some(&b'(') {
                continue;
            }
            return true;
        }
    }
    false
}

/// Backgrounding: a `&` left over once every `&&` is removed.
pub fn has_background(line: &str) -> bool {
    line.replace("&&", "").contains('&')
}
