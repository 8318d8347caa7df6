//! HTTP scenario runner
//!
//! Reads ordered scenarios from YAML, sends each step as an HTTP request,
//! verifies the responses and threads captured values into later steps.

use clap::Parser;
use scenario_runner::cli::{self, EXIT_FATAL};
use scenario_runner::commands::Commands;
use scenario_runner::common::logging;

#[derive(Parser)]
#[command(name = "scenario-runner", about = "Declarative HTTP scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Fatal error: {e}");
            std::process::exit(EXIT_FATAL);
        }
    }
}
