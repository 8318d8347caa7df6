//! Scenario definition types
//!
//! Steps are kept as raw value trees ([`StepTemplate`]) until they run, so
//! placeholders can stand in for numeric or structured fields. Resolving a
//! template produces a typed [`Step`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A named, ordered sequence of steps
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name of the scenario
    #[serde(default = "default_scenario_name")]
    pub name: String,
    /// File the scenario was loaded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Steps, executed in order
    #[serde(default)]
    pub steps: Vec<StepTemplate>,
}

fn default_scenario_name() -> String {
    "<unnamed>".to_string()
}

/// A step as written in the scenario file, before runtime substitution
///
/// Always a mapping; anything else is rejected when the file is loaded.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct StepTemplate(Value);

impl StepTemplate {
    /// Wrap a step mapping
    pub fn new(value: Value) -> Result<Self, String> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err("a step must be a mapping".to_string())
        }
    }

    /// The raw value tree
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Display name for the step at 1-based `index`
    pub fn label(&self, index: usize) -> String {
        match self.0.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Some(Value::String(_)) | Some(Value::Null) | None => format!("step-{index}"),
            Some(other) => other.to_string(),
        }
    }

    /// Interpret the template as a typed step without any substitution
    pub fn parse(&self) -> serde_json::Result<Step> {
        Step::deserialize(&self.0)
    }
}

impl<'de> Deserialize<'de> for StepTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        StepTemplate::new(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// One request/verify/capture unit, fully resolved
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Step {
    /// Step name; `step-N` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The request to send
    #[serde(default)]
    pub action: RequestSpec,
    /// Checks applied to the response
    #[serde(default)]
    pub verification: VerificationSpec,
    /// Values to extract from the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capture: Vec<CaptureSpec>,
}

/// Description of an HTTP request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method, case-insensitive (default: GET)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Target URL (required when the step is sent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,
    /// Sent as a JSON payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Query string parameters; sequence values repeat the parameter
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// Timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Client certificate: a combined PEM path or a (cert, key) pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<CertSpec>,
    /// Server certificate verification: on/off, or a CA bundle path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<TlsVerify>,
    /// `[user, password]` or `{type: basic, user, pass}`; other shapes are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
    /// Scheme (`http`, `https`, `all`) to proxy URL
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub proxies: Map<String, Value>,
    #[serde(default = "default_true")]
    pub allow_redirects: bool,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            method: None,
            url: None,
            headers: Map::new(),
            body: None,
            params: Map::new(),
            timeout: default_timeout(),
            cert: None,
            verify: None,
            auth: None,
            proxies: Map::new(),
            allow_redirects: true,
        }
    }
}

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Client certificate location
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CertSpec {
    /// PEM file holding both certificate and private key
    Combined(String),
    /// Separate certificate and key files
    Pair(String, String),
}

/// Server certificate verification setting
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TlsVerify {
    Enabled(bool),
    /// Path to a PEM CA bundle
    CaBundle(String),
}

/// Checks applied to a response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VerificationSpec {
    /// Expected HTTP status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Path-based assertions, evaluated in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_assertions: Vec<Assertion>,
}

/// A path-based assertion against a JSON body
///
/// At most one directive is honoured, in the order `exists`, `not_null`,
/// `contains`, `expected_value`. Without any directive the path only has
/// to resolve.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Assertion {
    /// JSON path to query (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Some matched value must equal this (an explicit `null` counts)
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
    /// Some matched value must contain (or equal) this
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub contains: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; absence stays `None`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Where a captured value comes from
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    #[default]
    Json,
    Header,
    Status,
}

/// Extraction of a response value into a named variable
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CaptureSpec {
    /// Variable name (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub source: CaptureSource,
    /// JSON path or header name; unused for `status`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
