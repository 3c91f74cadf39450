// src/error.rs

//! Unified error handling for the search engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for search engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database statement or transaction failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A URL could not be built from a base and a path
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetching a page failed
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Index maintenance gave up on a page
    #[error("Index update failed for page {page_id}: {message}")]
    Index { page_id: i64, message: String },

    /// A blocking wait or delay was interrupted
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a malformed URL error.
    pub fn malformed_url(message: impl Into<String>) -> Self {
        Self::MalformedUrl(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an index maintenance error for a page.
    pub fn index(page_id: i64, message: impl fmt::Display) -> Self {
        Self::Index {
            page_id,
            message: message.to_string(),
        }
    }

    /// Create an interruption error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = AppError::fetch("https://example.com/a", "connection reset");
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com/a: connection reset"
        );
    }

    #[test]
    fn test_index_error_display() {
        let err = AppError::index(7, "database is locked");
        assert_eq!(
            err.to_string(),
            "Index update failed for page 7: database is locked"
        );
    }
}
