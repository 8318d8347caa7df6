//! Declarative HTTP scenario runner
//!
//! Scenarios are ordered lists of steps. Each step is an HTTP request whose
//! response is verified and can feed values into the steps after it, either
//! through captured variables (`$name`) or direct response references
//! (`$resp[<ref>].status`, `.text`, `.jsonpath(<expr>)`).

pub mod capture;
pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod jsonpath;
pub mod resolver;
pub mod runner;
pub mod scenario;
pub mod verify;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use http::{HttpRequest, HttpResponse, Transport};
pub use runner::{run_all, run_scenario, RunOptions, RunReport, RuntimeContext, ScenarioReport};
pub use scenario::{Scenario, Step, StepTemplate};
