//! Formatted output helpers for CLI commands.

use xaas_graph::Output;

/// Width of section rules.
const RULE_WIDTH: usize = 48;

/// A horizontal double rule.
#[must_use]
pub fn rule() -> String {
    "\u{2550}".repeat(RULE_WIDTH)
}

/// Renders a lazy output the way a plan shows it: literals as-is,
/// references as `${<resource>.<attribute>}`.
#[must_use]
pub fn describe_output(output: &Output) -> String {
    match output {
        Output::Literal { value } => value.clone(),
        Output::Attribute { urn, attribute } => format!("${{{}.{attribute}}}", urn.name),
        Output::Concat { parts } => parts.iter().map(describe_output).collect(),
    }
}

/// Splits a `KEY=VALUE` command line pair.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got \"{raw}\"")),
    }
}
