//! Capture engine
//!
//! Pulls named values out of a response into the scenario's variables.
//! A failed capture is reported but never stops the scenario.

use serde::Serialize;
use serde_json::Value;

use crate::http::HttpResponse;
use crate::jsonpath;
use crate::runner::RuntimeContext;
use crate::scenario::{CaptureSource, CaptureSpec};

/// Result of one capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run every capture against `response`, storing successes in `ctx`
pub fn run_captures(
    response: &HttpResponse,
    captures: &[CaptureSpec],
    ctx: &mut RuntimeContext,
) -> Vec<CaptureOutcome> {
    captures
        .iter()
        .map(|spec| {
            let name = spec.name.clone().unwrap_or_default();
            match capture_value(response, spec) {
                Ok(value) => {
                    tracing::debug!(name = %name, value = %value, "captured value");
                    ctx.set_variable(name.clone(), value.clone());
                    CaptureOutcome {
                        name,
                        ok: true,
                        value: Some(value),
                        error: None,
                    }
                }
                Err(error) => {
                    tracing::warn!(name = %name, "{error}");
                    CaptureOutcome {
                        name,
                        ok: false,
                        value: None,
                        error: Some(error),
                    }
                }
            }
        })
        .collect()
}

/// Extract the value a single capture refers to
pub fn capture_value(response: &HttpResponse, spec: &CaptureSpec) -> Result<Value, String> {
    let name = match spec.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err("Invalid capture: missing 'name'".to_string()),
    };

    match spec.source {
        CaptureSource::Status => Ok(Value::from(response.status)),
        CaptureSource::Header => {
            let header = spec
                .path
                .as_deref()
                .ok_or_else(|| format!("Capture '{name}': header source requires 'path'"))?;
            response
                .header(header)
                .map(|value| Value::String(value.to_string()))
                .ok_or_else(|| format!("Capture '{name}': header '{header}' not found in response"))
        }
        CaptureSource::Json => {
            let path = spec
                .path
                .as_deref()
                .ok_or_else(|| format!("Capture '{name}': json source requires 'path'"))?;
            let body = response
                .json()
                .ok_or_else(|| format!("Capture '{name}': response body is not valid JSON"))?;
            let mut matches =
                jsonpath::find(path, &body).map_err(|e| format!("Capture '{name}': {e}"))?;
            match matches.len() {
                0 => Err(format!(
                    "Capture '{name}': JSON path '{path}' not found in response"
                )),
                1 => Ok(matches.remove(0)),
                _ => Ok(Value::Array(matches)),
            }
        }
    }
}
