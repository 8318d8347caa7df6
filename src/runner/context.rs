//! Per-scenario runtime state
//!
//! Responses are kept in one append-only log. Lookup by step name is a
//! derived index into that log; lookup by 1-based position and `last` are
//! computed from the log itself.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::http::HttpResponse;

/// Reserved reference naming the most recent response
pub const LAST: &str = "last";

/// Mutable state built up while a scenario runs
#[derive(Debug, Default)]
pub struct RuntimeContext {
    responses: Vec<HttpResponse>,
    by_name: HashMap<String, usize>,
    variables: Map<String, Value>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step's response; returns its 1-based index
    ///
    /// Reusing a step name points the name at the newer response; the
    /// older one stays reachable by index.
    pub fn record(&mut self, step_name: &str, response: HttpResponse) -> usize {
        self.responses.push(response);
        let index = self.responses.len();
        self.by_name.insert(step_name.to_string(), index - 1);
        index
    }

    /// Resolve a reference: `last`, a 1-based step index, or a step name
    pub fn lookup(&self, reference: &str) -> Option<&HttpResponse> {
        let reference = reference.trim();
        if reference == LAST {
            return self.last();
        }
        if let Ok(index) = reference.parse::<usize>() {
            return self.by_index(index);
        }
        self.by_name(reference)
    }

    pub fn last(&self) -> Option<&HttpResponse> {
        self.responses.last()
    }

    /// Response at a 1-based step index
    pub fn by_index(&self, index: usize) -> Option<&HttpResponse> {
        index.checked_sub(1).and_then(|i| self.responses.get(i))
    }

    pub fn by_name(&self, name: &str) -> Option<&HttpResponse> {
        self.by_name.get(name).and_then(|&i| self.responses.get(i))
    }

    /// Number of recorded responses
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Store a captured variable, replacing any earlier value
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// All captured variables
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }
}
