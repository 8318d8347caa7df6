//! Scenario runner
//!
//! Executes scenarios one at a time and their steps in order. Each step is
//! resolved against the scenario's runtime state, sent, verified, and then
//! mined for captures. The first failing step ends its scenario; other
//! scenarios are unaffected.

mod context;
mod report;

pub use context::{RuntimeContext, LAST};
pub use report::{
    FailureDetail, RequestSnapshot, ResponseSnapshot, RunReport, ScenarioReport, StepReport,
};

use colored::Colorize;
use std::time::Instant;

use crate::capture::run_captures;
use crate::common::{Error, Result};
use crate::http::{build_request, Transport};
use crate::resolver::{substitute_placeholders, substitute_responses};
use crate::scenario::{Scenario, Step, StepTemplate};
use crate::verify::verify_response;

/// Default length of response excerpts in reports
pub const DEFAULT_SNIPPET_LEN: usize = 1000;

/// Knobs for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum characters of response text kept in reports
    pub snippet_len: usize,
    /// Print request details for every step
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            snippet_len: DEFAULT_SNIPPET_LEN,
            verbose: false,
        }
    }
}

/// Run every scenario, each with a fresh transport from `make_transport`
///
/// Failing to create a transport is fatal to the whole run.
pub async fn run_all<T, F>(
    scenarios: &[Scenario],
    mut make_transport: F,
    options: &RunOptions,
) -> Result<RunReport>
where
    T: Transport,
    F: FnMut() -> Result<T>,
{
    let mut report = RunReport::default();
    for scenario in scenarios {
        let mut transport = make_transport()?;
        report.push(run_scenario(scenario, &mut transport, options).await);
    }
    Ok(report)
}

/// Run one scenario to completion or to its first failing step
pub async fn run_scenario<T>(
    scenario: &Scenario,
    transport: &mut T,
    options: &RunOptions,
) -> ScenarioReport
where
    T: Transport + ?Sized,
{
    let steps_total = scenario.steps.len();
    println!(
        "\n{} {} ({} step(s))",
        "Running scenario:".blue().bold(),
        scenario.name.white().bold(),
        steps_total
    );
    tracing::info!(scenario = %scenario.name, steps = steps_total, "scenario started");

    let mut ctx = RuntimeContext::new();
    let mut steps = Vec::with_capacity(steps_total);
    let mut failure = None;

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        let report = execute_step(step, step_num, &mut ctx, transport, options).await;

        match report.failure_reason().map(str::to_string) {
            None => {
                println!(
                    "  {} [{}/{}] {} {}",
                    "✓".green(),
                    step_num,
                    steps_total,
                    report.name,
                    format!("({} ms)", report.duration_ms).dimmed()
                );
                steps.push(report);
            }
            Some(reason) => {
                println!(
                    "  {} [{}/{}] {}: {}",
                    "✗".red(),
                    step_num,
                    steps_total,
                    report.name,
                    reason
                );
                tracing::info!(scenario = %scenario.name, step = step_num, "scenario failed");

                let response = report.response.as_ref();
                failure = Some(FailureDetail {
                    step_index: step_num,
                    step_name: report.name.clone(),
                    error: reason,
                    status_code: response.map(|r| r.status_code),
                    body_snippet: response.and_then(|r| r.body_snippet(options.snippet_len)),
                });
                steps.push(report);
                break;
            }
        }
    }

    let passed = failure.is_none();
    if passed {
        tracing::info!(scenario = %scenario.name, "scenario passed");
    }

    ScenarioReport {
        name: scenario.name.clone(),
        source: scenario.source.clone(),
        passed,
        steps_total,
        steps,
        failure,
    }
}

/// Apply captured variables, then response references, to a step template
pub fn resolve_step(template: &StepTemplate, ctx: &RuntimeContext) -> Result<Step> {
    let with_vars = substitute_placeholders(template.value(), ctx.variables());
    let resolved = substitute_responses(&with_vars, ctx);
    serde_json::from_value(resolved)
        .map_err(|e| Error::Config(format!("Step is invalid after substitution: {e}")))
}

async fn execute_step<T>(
    step: &StepTemplate,
    step_num: usize,
    ctx: &mut RuntimeContext,
    transport: &mut T,
    options: &RunOptions,
) -> StepReport
where
    T: Transport + ?Sized,
{
    let name = step.label(step_num);
    let started = Instant::now();
    let mut report = StepReport {
        index: step_num,
        name: name.clone(),
        duration_ms: 0,
        request: None,
        response: None,
        verification: None,
        captures: Vec::new(),
        error: None,
    };

    let prepared = resolve_step(step, ctx).and_then(|resolved| {
        let request = build_request(&resolved.action)?;
        Ok((resolved, request))
    });
    let (resolved, request) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            report.error = Some(e.to_string());
            report.duration_ms = elapsed_ms(started);
            return report;
        }
    };

    if options.verbose {
        println!("      {} {}", request.method.dimmed(), request.url.dimmed());
    }
    report.request = Some((&request).into());

    let response = match transport.send(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(step = %name, error = %e, "request failed");
            report.error = Some(if e.is_transport() {
                e.to_string()
            } else {
                format!("Request failed: {e}")
            });
            report.duration_ms = elapsed_ms(started);
            return report;
        }
    };

    let verdict = verify_response(&response, &resolved.verification);
    report.captures = run_captures(&response, &resolved.capture, ctx);
    report.response = Some(ResponseSnapshot::new(&response, options.snippet_len));
    report.verification = Some(verdict);

    ctx.record(&name, response);
    report.duration_ms = elapsed_ms(started);
    report
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
