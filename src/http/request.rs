//! Request builder
//!
//! Turns a resolved [`RequestSpec`] into a transport-agnostic [`HttpRequest`].

use serde_json::{Map, Value};
use std::time::Duration;

use crate::common::{Error, Result};
use crate::resolver::render;
use crate::scenario::{CertSpec, RequestSpec, TlsVerify};

/// Basic auth credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

/// A fully resolved request, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Uppercase HTTP method
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON payload
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
    pub cert: Option<CertSpec>,
    pub verify: Option<TlsVerify>,
    pub auth: Option<BasicAuth>,
    /// (scheme, proxy URL) pairs
    pub proxies: Vec<(String, String)>,
    pub allow_redirects: bool,
}

impl HttpRequest {
    /// Whether the request needs client settings beyond the session defaults
    pub fn needs_dedicated_client(&self) -> bool {
        self.cert.is_some()
            || self.verify.as_ref().is_some_and(|v| v != &TlsVerify::Enabled(true))
            || !self.proxies.is_empty()
            || !self.allow_redirects
    }
}

/// Build a request from a resolved spec
pub fn build_request(spec: &RequestSpec) -> Result<HttpRequest> {
    let url = spec
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Config("Missing URL in action".into()))?
        .to_string();

    let method = spec
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET")
        .to_uppercase();

    let timeout = Duration::try_from_secs_f64(spec.timeout)
        .ok()
        .filter(|t| !t.is_zero())
        .ok_or_else(|| {
            Error::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                spec.timeout
            ))
        })?;

    Ok(HttpRequest {
        method,
        url,
        headers: string_pairs(&spec.headers),
        body: spec.body.clone(),
        params: string_pairs(&spec.params),
        timeout,
        cert: spec.cert.clone(),
        verify: spec.verify.clone(),
        auth: spec.auth.as_ref().and_then(parse_auth),
        proxies: string_pairs(&spec.proxies),
        allow_redirects: spec.allow_redirects,
    })
}

/// Flatten a mapping into string pairs; sequences repeat the key, nulls are dropped
fn string_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| (key.clone(), render(v))),
            ),
            other => pairs.push((key.clone(), render(other))),
        }
    }
    pairs
}

/// Accepts `[user, password]` or `{type: basic, user, pass}`
fn parse_auth(auth: &Value) -> Option<BasicAuth> {
    match auth {
        Value::Array(items) if items.len() == 2 => Some(BasicAuth {
            user: render(&items[0]),
            password: render(&items[1]),
        }),
        Value::Object(map)
            if map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("basic")) =>
        {
            let field = |names: &[&str]| {
                names
                    .iter()
                    .find_map(|name| map.get(*name))
                    .map(render)
                    .unwrap_or_default()
            };
            Some(BasicAuth {
                user: field(&["user", "username"]),
                password: field(&["pass", "password"]),
            })
        }
        other => {
            tracing::debug!(auth = %other, "unsupported auth shape, sending without auth");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> RequestSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = build_request(&spec(json!({"url": "http://x/y"}))).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.timeout, Duration::from_secs(30));
        assert!(req.body.is_none());
        assert!(req.auth.is_none());
        assert!(req.allow_redirects);
        assert!(!req.needs_dedicated_client());
    }

    #[test]
    fn test_method_is_uppercased() {
        let req = build_request(&spec(json!({"url": "http://x", "method": "patch"}))).unwrap();
        assert_eq!(req.method, "PATCH");
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let err = build_request(&spec(json!({"method": "GET"}))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Missing URL"));

        assert!(build_request(&spec(json!({"url": "  "}))).is_err());
    }

    #[test]
    fn test_bad_timeout() {
        assert!(build_request(&spec(json!({"url": "http://x", "timeout": 0}))).is_err());
        let req = build_request(&spec(json!({"url": "http://x", "timeout": 1.5}))).unwrap();
        assert_eq!(req.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_headers_and_params_are_strings() {
        let req = build_request(&spec(json!({
            "url": "http://x",
            "headers": {"X-Count": 3, "X-Skip": null, "Accept": "application/json"},
            "params": {"tag": ["a", "b"], "page": 2}
        })))
        .unwrap();

        assert!(req.headers.contains(&("X-Count".into(), "3".into())));
        assert!(req.headers.contains(&("Accept".into(), "application/json".into())));
        assert_eq!(req.headers.len(), 2);
        assert!(req.params.contains(&("tag".into(), "a".into())));
        assert!(req.params.contains(&("tag".into(), "b".into())));
        assert!(req.params.contains(&("page".into(), "2".into())));
    }

    #[test]
    fn test_body_stays_structured() {
        let req = build_request(&spec(json!({
            "url": "http://x",
            "method": "POST",
            "body": {"name": "w", "tags": [1, 2]}
        })))
        .unwrap();
        assert_eq!(req.body, Some(json!({"name": "w", "tags": [1, 2]})));
    }

    #[test]
    fn test_auth_shapes() {
        let pair = build_request(&spec(json!({"url": "http://x", "auth": ["ada", "s3cret"]})))
            .unwrap()
            .auth;
        assert_eq!(
            pair,
            Some(BasicAuth {
                user: "ada".into(),
                password: "s3cret".into()
            })
        );

        let tagged = build_request(&spec(json!({
            "url": "http://x",
            "auth": {"type": "Basic", "user": "bob", "pass": "pw"}
        })))
        .unwrap()
        .auth;
        assert_eq!(
            tagged,
            Some(BasicAuth {
                user: "bob".into(),
                password: "pw".into()
            })
        );

        for ignored in [
            json!({"type": "bearer", "token": "t"}),
            json!(["only-one"]),
            json!("user:pass"),
        ] {
            let req = build_request(&spec(json!({"url": "http://x", "auth": ignored}))).unwrap();
            assert!(req.auth.is_none());
        }
    }

    #[test]
    fn test_client_level_options() {
        let req = build_request(&spec(json!({
            "url": "https://x",
            "verify": false,
            "proxies": {"https": "http://proxy:3128"},
            "allow_redirects": false
        })))
        .unwrap();
        assert!(req.needs_dedicated_client());
        assert_eq!(req.proxies, vec![("https".into(), "http://proxy:3128".into())]);

        let req = build_request(&spec(json!({"url": "https://x", "verify": true}))).unwrap();
        assert!(!req.needs_dedicated_client());
    }
}
