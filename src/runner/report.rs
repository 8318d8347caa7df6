//! Report structures
//!
//! Everything here serializes to the JSON report; the console summary is
//! rendered from the same data.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::capture::CaptureOutcome;
use crate::common::truncate_chars;
use crate::http::{HttpRequest, HttpResponse};
use crate::verify::Verdict;

/// The request as it was sent (credentials omitted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl From<&HttpRequest> for RequestSnapshot {
    fn from(request: &HttpRequest) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: join_headers(&request.headers),
            params: request.params.clone(),
            body: request.body.clone(),
        }
    }
}

/// What came back: parsed JSON when possible, otherwise a text snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    pub headers: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
}

impl ResponseSnapshot {
    pub fn new(response: &HttpResponse, snippet_len: usize) -> Self {
        let json = response.json();
        let text_snippet = match json {
            Some(_) => None,
            None => Some(truncate_chars(&response.text, snippet_len)),
        };
        Self {
            status_code: response.status,
            headers: join_headers(&response.headers),
            json,
            text_snippet,
        }
    }

    /// Body excerpt for failure summaries: pretty JSON or raw text, truncated
    pub fn body_snippet(&self, snippet_len: usize) -> Option<String> {
        match (&self.json, &self.text_snippet) {
            (Some(json), _) => serde_json::to_string_pretty(json)
                .ok()
                .map(|s| truncate_chars(&s, snippet_len)),
            (None, Some(text)) if !text.is_empty() => Some(truncate_chars(text, snippet_len)),
            _ => None,
        }
    }
}

/// Repeated header names are joined with ", "
fn join_headers(headers: &[(String, String)]) -> Map<String, Value> {
    let mut joined = Map::new();
    for (name, value) in headers {
        match joined.get_mut(name) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                joined.insert(name.clone(), Value::String(value.clone()));
            }
        }
    }
    joined
}

/// Record of one executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 1-based position in the scenario
    pub index: usize,
    pub name: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// Absent when the step failed before a response arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verdict>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub captures: Vec<CaptureOutcome>,
    /// Failure that happened before verification (build or transport)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    /// The reason this step failed, if it did
    pub fn failure_reason(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| {
            self.verification
                .as_ref()
                .filter(|v| !v.ok)
                .and_then(|v| v.error.as_deref())
        })
    }
}

/// Where and why a scenario stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDetail {
    pub step_index: usize,
    pub step_name: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_snippet: Option<String>,
}

/// Record of one scenario; steps after a failure are absent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub passed: bool,
    pub steps_total: usize,
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

impl ScenarioReport {
    pub fn steps_run(&self) -> usize {
        self.steps.len()
    }
}

/// Aggregate over all scenarios of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub scenarios_total: usize,
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios_total += 1;
        if scenario.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.scenarios.push(scenario);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failed scenarios paired with their failure detail
    pub fn failures(&self) -> impl Iterator<Item = (&ScenarioReport, &FailureDetail)> {
        self.scenarios
            .iter()
            .filter_map(|s| s.failure.as_ref().map(|f| (s, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_snapshot_prefers_json() {
        let resp = HttpResponse::json_body(200, &json!({"a": 1}));
        let snap = ResponseSnapshot::new(&resp, 1000);
        assert_eq!(snap.json, Some(json!({"a": 1})));
        assert!(snap.text_snippet.is_none());
        assert_eq!(snap.body_snippet(1000).as_deref(), Some("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_response_snapshot_truncates_text() {
        let resp = HttpResponse::new(502, "x".repeat(50));
        let snap = ResponseSnapshot::new(&resp, 10);
        assert_eq!(snap.text_snippet.as_deref(), Some("xxxxxxxxxx"));
        assert_eq!(snap.body_snippet(4).as_deref(), Some("xxxx"));
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let resp = HttpResponse::new(200, "")
            .with_header("Set-Cookie", "a=1")
            .with_header("Set-Cookie", "b=2");
        let snap = ResponseSnapshot::new(&resp, 10);
        assert_eq!(snap.headers.get("Set-Cookie"), Some(&json!("a=1, b=2")));
    }

    #[test]
    fn test_run_report_counts() {
        let scenario = |name: &str, passed: bool| ScenarioReport {
            name: name.to_string(),
            source: None,
            passed,
            steps_total: 0,
            steps: Vec::new(),
            failure: (!passed).then(|| FailureDetail {
                step_index: 1,
                step_name: "step-1".into(),
                error: "boom".into(),
                status_code: None,
                body_snippet: None,
            }),
        };

        let mut report = RunReport::default();
        report.push(scenario("a", true));
        report.push(scenario("b", false));

        assert_eq!(report.scenarios_total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
        assert_eq!(report.failures().count(), 1);
    }
}
