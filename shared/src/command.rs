//! Command text parsing
//!
//! A command is a message starting with one of the configured prefixes,
//! followed by the command name and an optional free-text argument.

use regex_lite::Regex;
use std::sync::OnceLock;

/// A command split into name and argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    /// Remaining text, trimmed; empty when absent
    pub args: String,
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^(\S+)\s*(.*)$").expect("valid command regex"))
}

/// Parse `text` as a command if it starts with one of `prefixes`.
///
/// The longest matching prefix wins, so `"//"` can coexist with `"/"`.
/// Returns `None` for plain chat messages.
pub fn parse_command<S: AsRef<str>>(text: &str, prefixes: &[S]) -> Option<ParsedCommand> {
    let text = text.trim_start();

    let rest = prefixes
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| text.starts_with(*p))
        .max_by_key(|p| p.len())
        .map(|p| &text[p.len()..])?;

    let captures = command_regex().captures(rest)?;
    let name = captures.get(1)?.as_str().to_string();
    let args = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(ParsedCommand { name, args })
}
