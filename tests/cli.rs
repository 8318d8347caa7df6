//! End-to-end tests for the scenario-runner binary
//!
//! These run the compiled CLI against scenario files written to a temp dir
//! and check exit codes, console output and the JSON report. No test needs
//! a live server; the failing run points at a closed local port.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Temp directory holding the files of one test
struct TestContext {
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_scenario-runner"))
            .args(args)
            .current_dir(self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env("NO_PROXY", "127.0.0.1")
            .output()
            .expect("Failed to run scenario-runner")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

const VALID: &str = r#"
scenarios:
  - name: health
    steps:
      - name: ping
        action: {url: "$BASE_URL/health"}
        verification:
          status_code: 200
          json_assertions:
            - {path: "$.status", expected_value: ok}
        capture:
          - {name: code, source: status}
"#;

#[test]
fn validate_accepts_well_formed_scenarios() {
    let ctx = TestContext::new();
    let file = ctx.write("valid.yaml", VALID);

    let output = ctx.run(&["validate", "-s", arg(&file)]);

    assert_eq!(output.status.code(), Some(0), "{}", stdout(&output));
    assert!(stdout(&output).contains("1 scenario(s) checked, 0 problem(s) found"));
}

#[test]
fn validate_reports_missing_fields() {
    let ctx = TestContext::new();
    let file = ctx.write(
        "broken.yaml",
        r#"
scenarios:
  - name: broken
    steps:
      - action: {method: GET}
        verification:
          json_assertions:
            - {expected_value: 1}
"#,
    );

    let output = ctx.run(&["validate", "-s", arg(&file)]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(3));
    assert!(out.contains("missing 'url' in action"), "{out}");
    assert!(out.contains("assertion 1 is missing 'path'"), "{out}");
}

#[test]
fn missing_scenarios_file_is_fatal() {
    let ctx = TestContext::new();

    let output = ctx.run(&["run", "-s", arg(&ctx.path("nope.yaml"))]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Fatal error"));
}

#[test]
fn file_without_scenarios_key_is_fatal() {
    let ctx = TestContext::new();
    let file = ctx.write("bad.yaml", "tests:\n  - name: x\n");

    let output = ctx.run(&["run", "-s", arg(&file)]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("missing 'scenarios' key"));
}

#[test]
fn empty_scenarios_pass() {
    let ctx = TestContext::new();
    let file = ctx.write("empty.yaml", "scenarios:\n  - name: nothing\n    steps: []\n");

    let output = ctx.run(&["run", "-s", arg(&file)]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.contains("Scenarios executed: 1"));
    assert!(out.contains("Passed: 1"));
}

#[test]
fn unreachable_server_fails_run_and_writes_report() {
    let ctx = TestContext::new();
    let file = ctx.write("health.yaml", VALID);
    let config = ctx.write("env.toml", "BASE_URL = \"http://127.0.0.1:9\"\n");
    let report = ctx.path("report.json");

    let output = ctx.run(&[
        "run",
        "-s",
        arg(&file),
        "-c",
        arg(&config),
        "--report",
        arg(&report),
    ]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(2), "{out}\n{}", stderr(&output));
    assert!(out.contains("Failed: 1"));
    assert!(out.contains("Scenario: health"));
    assert!(out.contains("Step #1: ping"));
    assert!(out.contains("Request failed"));

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report written"))
            .expect("report is JSON");
    assert_eq!(json["scenarios_total"], 1);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["scenarios"][0]["failure"]["step_name"], "ping");
    assert_eq!(
        json["scenarios"][0]["steps"][0]["request"]["url"],
        "http://127.0.0.1:9/health"
    );
}
