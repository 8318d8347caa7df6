//! Scenario definitions and loading
//!
//! Scenarios are read from YAML files, have config placeholders applied,
//! and stay immutable while they run.

mod loader;
mod types;

pub use loader::{load_file, load_scenarios, parse_scenarios, validate};
pub use types::*;
