//! Scenario file loading
//!
//! A scenario file is a YAML mapping with a `scenarios` sequence. Config
//! placeholders are substituted on the raw document, before it is turned
//! into typed scenarios, so a typed value can land in any field.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::types::Scenario;
use crate::common::{Config, Error, Result};
use crate::resolver::substitute_placeholders;

/// Load scenarios from files and directories, in the order given
///
/// Directories contribute their `*.yaml` / `*.yml` files, sorted by name.
pub fn load_scenarios(paths: &[PathBuf], config: Option<&Config>) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    for path in expand_paths(paths)? {
        scenarios.extend(load_file(&path, config)?);
    }
    Ok(scenarios)
}

/// Load the scenarios of a single file, tagging each with its origin
pub fn load_file(path: &Path, config: Option<&Config>) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;

    let mut scenarios = parse_scenarios(&content, config).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;

    let source = path.display().to_string();
    for scenario in &mut scenarios {
        scenario.source.get_or_insert_with(|| source.clone());
    }

    tracing::debug!(path = %path.display(), count = scenarios.len(), "loaded scenarios");
    Ok(scenarios)
}

/// Parse scenario file content
pub fn parse_scenarios(content: &str, config: Option<&Config>) -> Result<Vec<Scenario>> {
    let document: Value = serde_yaml::from_str(content)
        .map_err(|e| Error::Config(format!("Failed to parse scenarios: {e}")))?;

    let raw = match document {
        Value::Object(mut map) => map
            .remove("scenarios")
            .ok_or_else(|| Error::Config("Invalid scenarios file: missing 'scenarios' key".into()))?,
        _ => {
            return Err(Error::Config(
                "Invalid scenarios file: missing 'scenarios' key".into(),
            ))
        }
    };

    let raw = match raw {
        Value::Array(_) => raw,
        Value::Null => Value::Array(Vec::new()),
        _ => return Err(Error::Config("'scenarios' must be a sequence".into())),
    };

    let raw = match config {
        Some(config) if !config.is_empty() => substitute_placeholders(&raw, config.values()),
        _ => raw,
    };

    serde_json::from_value(raw).map_err(|e| Error::Config(format!("Invalid scenario: {e}")))
}

/// Structural problems that will make a scenario fail once it runs
///
/// Steps that still hold `$name` or `$resp[..]` placeholders are only checked
/// for required fields, since their types are not known until runtime.
pub fn validate(scenario: &Scenario) -> Vec<String> {
    let mut problems = Vec::new();

    for (i, template) in scenario.steps.iter().enumerate() {
        let label = format!("step {} ({})", i + 1, template.label(i + 1));
        let raw = template.value();

        let url = raw.get("action").and_then(|action| action.get("url"));
        if url.is_none_or(|url| url.is_null() || url.as_str().is_some_and(|u| u.trim().is_empty())) {
            problems.push(format!("{label}: missing 'url' in action"));
        }

        let assertions = raw
            .get("verification")
            .and_then(|v| v.get("json_assertions"))
            .and_then(Value::as_array);
        for (j, assertion) in assertions.into_iter().flatten().enumerate() {
            if !has_field(assertion, "path") {
                problems.push(format!("{label}: assertion {} is missing 'path'", j + 1));
            }
        }

        let captures = raw.get("capture").and_then(Value::as_array);
        for (j, capture) in captures.into_iter().flatten().enumerate() {
            if !has_field(capture, "name") {
                problems.push(format!("{label}: capture {} is missing 'name'", j + 1));
            }
            let is_status = capture.get("source").and_then(Value::as_str) == Some("status");
            if !is_status && !has_field(capture, "path") {
                problems.push(format!("{label}: capture {} is missing 'path'", j + 1));
            }
        }

        if let Err(e) = template.parse() {
            if !has_placeholders(raw) {
                problems.push(format!("{label}: {e}"));
            }
        }
    }

    problems
}

fn has_field(value: &Value, field: &str) -> bool {
    match value.get(field) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn has_placeholders(value: &Value) -> bool {
    match value {
        Value::String(s) => s
            .split('$')
            .skip(1)
            .any(|rest| rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')),
        Value::Array(items) => items.iter().any(has_placeholders),
        Value::Object(map) => map.values().any(has_placeholders),
        _ => false,
    }
}

fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(|e| Error::file_read(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        found.sort();

        if found.is_empty() {
            tracing::warn!(dir = %path.display(), "no scenario files found in directory");
        }
        files.extend(found);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCENARIOS: &str = r#"
scenarios:
  - name: health
    steps:
      - name: ping
        action:
          method: get
          url: $BASE_URL/health
          timeout: $TIMEOUT
        verification:
          status_code: 200
  - name: empty
    steps: []
"#;

    fn config() -> Config {
        Config::from_value(json!({"BASE_URL": "http://localhost:9000", "TIMEOUT": 5})).unwrap()
    }

    #[test]
    fn test_parse_with_config() {
        let scenarios = parse_scenarios(SCENARIOS, Some(&config())).unwrap();
        assert_eq!(scenarios.len(), 2);

        let step = scenarios[0].steps[0].parse().unwrap();
        assert_eq!(step.action.url.as_deref(), Some("http://localhost:9000/health"));
        assert_eq!(step.action.timeout, 5.0);
        assert_eq!(step.verification.status_code, Some(200));
        assert!(scenarios[1].steps.is_empty());
    }

    #[test]
    fn test_parse_without_config_leaves_placeholders() {
        let scenarios = r#"
scenarios:
  - name: raw
    steps:
      - action:
          url: $BASE_URL/health
"#;
        let scenarios = parse_scenarios(scenarios, None).unwrap();
        let step = scenarios[0].steps[0].parse().unwrap();
        assert_eq!(step.action.url.as_deref(), Some("$BASE_URL/health"));
    }

    #[test]
    fn test_unresolved_typed_placeholder_is_kept_for_runtime() {
        let scenarios = parse_scenarios(SCENARIOS, None).unwrap();
        let template = &scenarios[0].steps[0];
        assert_eq!(template.value()["action"]["timeout"], json!("$TIMEOUT"));
        assert!(template.parse().is_err());
        assert!(validate(&scenarios[0]).is_empty());
    }

    #[test]
    fn test_step_must_be_mapping() {
        let err = parse_scenarios("scenarios:\n  - name: x\n    steps: [\"GET /\"]\n", None)
            .unwrap_err();
        assert!(err.to_string().contains("a step must be a mapping"));
    }

    #[test]
    fn test_validate_reports_type_errors_without_placeholders() {
        let scenarios = parse_scenarios(
            "scenarios:\n  - steps:\n      - action: {url: 'http://x', timeout: soon}\n",
            None,
        )
        .unwrap();
        let problems = validate(&scenarios[0]);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("step 1 (step-1)"));
    }

    #[test]
    fn test_missing_scenarios_key() {
        let err = parse_scenarios("tests: []", None).unwrap_err();
        assert!(err.to_string().contains("missing 'scenarios' key"));

        let err = parse_scenarios("[]", None).unwrap_err();
        assert!(err.to_string().contains("missing 'scenarios' key"));
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let scenarios = parse_scenarios(
            r#"
scenarios:
  - name: broken
    steps:
      - name: no-url
        action: {}
        verification:
          json_assertions:
            - expected_value: 1
        capture:
          - path: $.id
          - name: code
            source: status
"#,
            None,
        )
        .unwrap();

        let problems = validate(&scenarios[0]);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("missing 'url'"));
        assert!(problems[1].contains("assertion 1 is missing 'path'"));
        assert!(problems[2].contains("capture 1 is missing 'name'"));
    }

    #[test]
    fn test_load_directory_sets_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "scenarios:\n  - name: second\n").unwrap();
        std::fs::write(dir.path().join("a.yml"), "scenarios:\n  - name: first\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenarios = load_scenarios(&[dir.path().to_path_buf()], None).unwrap();
        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(scenarios[0].source.as_deref().unwrap().ends_with("a.yml"));
    }
}
