//! Response verification
//!
//! Checks the status code first, then each JSON assertion in order, and
//! stops at the first failure. Failure messages always name the queried
//! path and what was actually found there.

use serde::Serialize;
use serde_json::Value;

use crate::http::HttpResponse;
use crate::jsonpath;
use crate::scenario::{Assertion, VerificationSpec};

/// Outcome of verifying one response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self { ok: true, error: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Verify a response against a step's verification block
pub fn verify_response(response: &HttpResponse, spec: &VerificationSpec) -> Verdict {
    if let Some(expected) = spec.status_code {
        if response.status != expected {
            return Verdict::fail(format!(
                "Status Code mismatch: expected {}, got {}",
                expected, response.status
            ));
        }
    }

    if spec.json_assertions.is_empty() {
        return Verdict::pass();
    }

    let Some(body) = response.json() else {
        return Verdict::fail("Response body is not valid JSON but json_assertions were provided");
    };

    for assertion in &spec.json_assertions {
        if let Err(message) = check_assertion(&body, assertion) {
            return Verdict::fail(message);
        }
    }

    Verdict::pass()
}

/// Evaluate one assertion against a parsed body
pub fn check_assertion(body: &Value, assertion: &Assertion) -> Result<(), String> {
    let path = match assertion.path.as_deref() {
        Some(path) if !path.trim().is_empty() => path,
        _ => return Err("Invalid assertion: missing 'path'".to_string()),
    };

    let matches = jsonpath::find(path, body).map_err(|e| e.to_string())?;
    let found = !matches.is_empty();

    if let Some(should_exist) = assertion.exists {
        return match (should_exist, found) {
            (true, true) | (false, false) => Ok(()),
            (true, false) => Err(format!(
                "JSON path '{path}' not found in response (expected it to exist)"
            )),
            (false, true) => Err(format!(
                "JSON path '{path}' expected to be absent but got {}",
                describe(&matches)
            )),
        };
    }

    if assertion.not_null == Some(true) {
        if !found {
            return Err(format!(
                "JSON path '{path}' not found in response (expected a non-null value)"
            ));
        }
        if matches.iter().any(is_empty_marker) {
            return Err(format!(
                "JSON path '{path}' expected a non-null value but got {}",
                describe(&matches)
            ));
        }
        return Ok(());
    }

    if let Some(needle) = &assertion.contains {
        if !found {
            return Err(format!(
                "JSON path '{path}' not found in response (expected it to contain {needle})"
            ));
        }
        if matches.iter().any(|m| value_contains(m, needle)) {
            return Ok(());
        }
        return Err(format!(
            "JSON path '{path}' expected to contain {needle} but got {}",
            describe(&matches)
        ));
    }

    if let Some(expected) = &assertion.expected_value {
        if !found {
            return Err(format!(
                "JSON path '{path}' not found in response (expected {expected})"
            ));
        }
        if matches.iter().any(|m| values_equal(m, expected)) {
            return Ok(());
        }
        return Err(format!(
            "JSON path '{path}' expected {expected} but got {}",
            describe(&matches)
        ));
    }

    if !found {
        return Err(format!("JSON path '{path}' not found in response"));
    }
    Ok(())
}

/// Structural equality where `1` and `1.0` are the same number
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(x), Some(y)) if x == y)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Membership for sequences, key-or-value membership for mappings, equality otherwise
fn value_contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        Value::Object(map) => {
            needle.as_str().is_some_and(|key| map.contains_key(key))
                || map.values().any(|v| values_equal(v, needle))
        }
        scalar => values_equal(scalar, needle),
    }
}

fn is_empty_marker(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// A single match is shown on its own, several as a sequence
fn describe(matches: &[Value]) -> String {
    match matches {
        [single] => single.to_string(),
        many => Value::Array(many.to_vec()).to_string(),
    }
}
