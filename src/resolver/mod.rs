//! Placeholder substitution
//!
//! Two independent passes share the `$` token syntax:
//!
//! - [`substitute_placeholders`] fills `$key` tokens from a flat mapping. It
//!   runs once at load time against the config file, and again per step
//!   against the variables captured so far.
//! - [`substitute_responses`] fills `$resp[<ref>].status`, `.text` and
//!   `.jsonpath(<expr>)` tokens from earlier responses, right before a step
//!   is sent.
//!
//! Neither pass fails. Anything that cannot be resolved is left as written,
//! so the problem shows up when the request is built or verified.

mod placeholders;
mod responses;

pub use placeholders::{substitute_placeholders, substitute_str};
pub use responses::{substitute_response_str, substitute_responses};

use serde_json::Value;

/// Apply `f` to every string leaf of a value tree; mapping keys are untouched
fn map_strings(value: &Value, f: &dyn Fn(&str) -> Value) -> Value {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => Value::Array(items.iter().map(|v| map_strings(v, f)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), map_strings(v, f)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// String form used when a value is spliced into a larger string
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render() {
        assert_eq!(render(&json!("plain")), "plain");
        assert_eq!(render(&json!(42)), "42");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&json!(null)), "null");
        assert_eq!(render(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_map_strings_recurses_and_keeps_keys() {
        let value = json!({"$k": ["$k", {"deep": "$k"}], "n": 1});
        let mapped = map_strings(&value, &|s| Value::String(s.replace("$k", "v")));
        assert_eq!(mapped, json!({"$k": ["v", {"deep": "v"}], "n": 1}));
    }
}
