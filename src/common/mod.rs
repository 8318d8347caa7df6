//! Common utilities shared by the library and the CLI

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};

/// Truncate text to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
