//! Strips indirection wrappers (`sudo`, `env`, `xargs`, `bash -c`, ...) from
//! the front of a command string until the command the user actually cares
//! about is exposed.
//!
//! The peeler never parses quotes except for the `bash -c '<payload>'` case,
//! and never evaluates substitutions. Splitting is plain whitespace splitting;
//! anything more ambitious would change the security guarantees downstream.

use crate::security::tables::{IndirectionKind, flags_with_args, indirection_kind};

/// Wrapper chains longer than this are pathological; peeling stops there.
const MAX_PEEL_DEPTH: usize = 10;

/// Result of peeling: the residual command and the wrappers removed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeledCommand {
    pub residual: String,
    pub chain: Vec<String>,
}

/// Split one whitespace-delimited token off the front of `s`.
///
/// Returns the token and the remainder with leading whitespace trimmed.
fn take_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(at) => Some((&s[..at], s[at..].trim_start())),
        None => Some((s, "")),
    }
}

/// Iteratively remove indirection wrappers from the front of `command`.
///
/// Single-token commands are never treated as indirection, and a shell that
/// is not followed by `-c` is script execution rather than indirection: the
/// residual keeps the shell as its binary so the blocklist can catch it.
pub fn peel(command: &str) -> PeeledCommand {
    let mut residual = command.to_string();
    let mut chain: Vec<String> = Vec::new();

    for _ in 0..MAX_PEEL_DEPTH {
        let trimmed = residual.trim_start();
        // No space means a single token, which cannot wrap anything.
        if !trimmed.contains(char::is_whitespace) {
            break;
        }
        let Some((head, rest)) = take_token(trimmed) else {
            break;
        };
        let Some(kind) = indirection_kind(head) else {
            break;
        };
        let head = head.to_string();
        chain.push(head.clone());

        match kind {
            IndirectionKind::PrefixFlags | IndirectionKind::Xargs => {
                residual = strip_flags(rest, &head, false);
            }
            IndirectionKind::PrefixKv => {
                residual = strip_flags(rest, &head, true);
            }
            IndirectionKind::ShellC => {
                match strip_shell_c(rest) {
                    Some(inner) => residual = inner,
                    None => {
                        // `bash script.sh`: not indirection after all.
                        chain.pop();
                        break;
                    }
                }
            }
        }
    }

    PeeledCommand { residual, chain }
}

/// Consume wrapper flags (and, for `env`, `KEY=VAL` assignments) from the
/// front of `rest`, returning whatever follows.
fn strip_flags(rest: &str, wrapper: &str, consume_assignments: bool) -> String {
    let arg_flags = flags_with_args(wrapper);
    let mut remaining = rest;

    while let Some((token, after)) = take_token(remaining) {
        if token == "--" {
            // End-of-options marker: consume it and stop.
            remaining = after;
            break;
        }
        if token.starts_with('-') {
            remaining = after;
            // `--key=value` is self-contained; a listed flag eats one more token.
            if !token.contains('=') && arg_flags.contains(&token) {
                if let Some((_arg, after_arg)) = take_token(remaining) {
                    remaining = after_arg;
                }
            }
            continue;
        }
        if consume_assignments && token.contains('=') {
            remaining = after;
            continue;
        }
        break;
    }

    remaining.to_string()
}

/// Handle a shell head: require `-c`, then unquote the payload.
///
/// Returns `None` when the next token does not begin with `-c`, in which case
/// the shell is executing a script and must not be peeled.
fn strip_shell_c(rest: &str) -> Option<String> {
    let (flag, after) = take_token(rest)?;
    if !flag.starts_with("-c") {
        return None;
    }
    Some(unquote(after.trim()).to_string())
}

/// Strip one layer of matching single or double quotes, if present.
fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
