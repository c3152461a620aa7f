//! Operator marker recognition.
//!
//! A node is an inject marker only when its whole (trimmed) string value is
//! `(( inject <args> ))`. Markers embedded in longer strings, or wrapped in
//! literal quotes, are plain data.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;

static INJECT_OP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(\(\s*inject\s+(.+?)\s*\)\)$").expect("inject marker regex is valid")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Returns the argument text when `value` is an inject marker.
pub fn parse_inject_op(value: &Value) -> Option<&str> {
    let text = match value {
        Value::String(s) => s.trim(),
        _ => return None,
    };
    INJECT_OP
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// True when `value` is an inject marker.
pub fn is_inject_op(value: &Value) -> bool {
    parse_inject_op(value).is_some()
}

/// Split marker arguments into target paths.
///
/// Whitespace-only input yields a single empty target, which then fails
/// path resolution with a normal not-found error.
pub fn split_targets(args: &str) -> Vec<&str> {
    WHITESPACE.split(args.trim()).collect()
}
