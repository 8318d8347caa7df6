//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios and report the results
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Write the full report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Maximum characters of response body kept in the report
        #[arg(long, default_value_t = crate::runner::DEFAULT_SNIPPET_LEN)]
        snippet_len: usize,

        /// Print request details for every step
        #[arg(long, short)]
        verbose: bool,
    },

    /// Load and check scenarios without sending any request
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Where scenarios and substitution values come from
#[derive(Args)]
pub struct InputArgs {
    /// Scenario file or directory of *.yaml files (repeatable)
    #[arg(long = "scenarios", short = 's', default_value = "scenarios.yaml")]
    pub scenarios: Vec<PathBuf>,

    /// Flat key/value file (YAML or TOML) used to fill $KEY placeholders
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
