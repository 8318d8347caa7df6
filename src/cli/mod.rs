//! CLI command handling
//!
//! Loads scenarios, runs them, and prints the summary. The returned code
//! becomes the process exit status.

use colored::Colorize;
use std::path::Path;

use crate::commands::{Commands, InputArgs};
use crate::common::{Config, Error, Result};
use crate::http::ReqwestTransport;
use crate::runner::{self, RunOptions, RunReport};
use crate::scenario::{self, Scenario};

/// Every scenario passed
pub const EXIT_SUCCESS: i32 = 0;
/// At least one scenario failed
pub const EXIT_FAILED: i32 = 2;
/// Nothing could run (bad input, unreadable files)
pub const EXIT_FATAL: i32 = 3;

/// Dispatch a CLI command, returning the exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            input,
            report,
            snippet_len,
            verbose,
        } => {
            let scenarios = load(&input)?;
            let options = RunOptions {
                snippet_len,
                verbose,
            };

            let run = runner::run_all(&scenarios, ReqwestTransport::new, &options).await?;
            print_summary(&run);

            if let Some(path) = report {
                write_report(&run, &path)?;
                println!("\nReport written to {}", path.display());
            }

            Ok(if run.all_passed() {
                EXIT_SUCCESS
            } else {
                EXIT_FAILED
            })
        }

        Commands::Validate { input } => {
            let scenarios = load(&input)?;
            let mut problems = 0;

            for scenario in &scenarios {
                let issues = scenario::validate(scenario);
                if issues.is_empty() {
                    println!("{} {}", "✓".green(), scenario.name);
                    continue;
                }
                println!("{} {}", "✗".red(), scenario.name);
                for issue in &issues {
                    println!("    {issue}");
                }
                problems += issues.len();
            }

            println!(
                "\n{} scenario(s) checked, {} problem(s) found",
                scenarios.len(),
                problems
            );
            Ok(if problems == 0 { EXIT_SUCCESS } else { EXIT_FATAL })
        }
    }
}

fn load(input: &InputArgs) -> Result<Vec<Scenario>> {
    let config = input.config.as_deref().map(Config::load).transpose()?;
    if let Some(config) = &config {
        tracing::debug!(keys = config.len(), "loaded substitution config");
    }
    scenario::load_scenarios(&input.scenarios, config.as_ref())
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to write report '{}': {}", path.display(), e),
        ))
    })
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "=== Summary ===".bold());
    println!("Scenarios executed: {}", report.scenarios_total);
    println!("Passed: {}", report.passed.to_string().green());
    println!(
        "Failed: {}",
        if report.failed > 0 {
            report.failed.to_string().red()
        } else {
            report.failed.to_string().normal()
        }
    );

    if report.all_passed() {
        return;
    }

    println!("\n{}", "Failures detail:".bold());
    for (scenario, failure) in report.failures() {
        match &scenario.source {
            Some(source) => println!("- Scenario: {} ({})", scenario.name, source.dimmed()),
            None => println!("- Scenario: {}", scenario.name),
        }
        println!("  Step #{}: {}", failure.step_index, failure.step_name);
        println!("  Reason: {}", failure.error.red());
        if let Some(status) = failure.status_code {
            println!("  HTTP status: {status}");
        }
        if let Some(body) = &failure.body_snippet {
            println!("  Response body (snippet): {body}");
        }
    }
}
