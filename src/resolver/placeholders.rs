//! `$key` substitution from a flat mapping

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::{map_strings, render};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z0-9_]+)").expect("failed to compile placeholder regex")
});

static EXACT_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z0-9_]+)$").expect("failed to compile placeholder regex")
});

/// Substitute `$key` placeholders in every string leaf of `value`
pub fn substitute_placeholders(value: &Value, vars: &Map<String, Value>) -> Value {
    if vars.is_empty() {
        return value.clone();
    }
    map_strings(value, &|s| substitute_str(s, vars))
}

/// Substitute `$key` placeholders in a single string
///
/// A string that is exactly one known placeholder becomes the typed value.
/// Otherwise every known placeholder is replaced by its string form and
/// unknown ones stay as written. A token directly followed by `[` is a
/// response reference and is never treated as a key.
pub fn substitute_str(text: &str, vars: &Map<String, Value>) -> Value {
    if !text.contains('$') {
        return Value::String(text.to_string());
    }

    if let Some(caps) = EXACT_PLACEHOLDER_RE.captures(text) {
        if let Some(value) = vars.get(&caps[1]) {
            tracing::debug!(key = &caps[1], "typed placeholder substitution");
            return value.clone();
        }
    }

    let replaced = PLACEHOLDER_RE.replace_all(text, |caps: &Captures| {
        let end = caps.get(0).map_or(text.len(), |m| m.end());
        if text[end..].starts_with('[') {
            return caps[0].to_string();
        }
        match vars.get(&caps[1]) {
            Some(value) => render(value),
            None => caps[0].to_string(),
        }
    });

    Value::String(replaced.into_owned())
}
