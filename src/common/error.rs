//! Error types for the scenario runner
//!
//! Messages are meant to be read by whoever wrote the scenario file, so they
//! name the offending field or file and say what was expected.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Transport Errors ===
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error belongs to the transport layer (connection, timeout)
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::Config(format!("Invalid request: {e}"))
        } else {
            Error::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(Error::Transport("refused".into()).is_transport());
        assert!(Error::Timeout(30).is_transport());
        assert!(!Error::Config("missing url".into()).is_transport());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let e = Error::Timeout(5);
        assert_eq!(e.to_string(), "Request timed out after 5 seconds");

        let e = Error::file_read(std::path::Path::new("a.yaml"), "not found");
        assert_eq!(e.to_string(), "Failed to read file 'a.yaml': not found");
    }
}
