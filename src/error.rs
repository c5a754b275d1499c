// src/error.rs

//! Unified error handling for the scrape, geocode and cache pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for mapthens operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required configuration (e.g. the map credential) is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network request could not be completed
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote service answered with a non-success status
    #[error("Upstream error for {context}: HTTP {status}")]
    Upstream { context: String, status: u16 },

    /// Response body or cache file could not be decoded
    #[error("Decode error for {context}: {message}")]
    Decode { context: String, message: String },

    /// Lookup produced nothing (no geocoding candidates, no cache file)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Listing document could not be parsed as markup
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Object store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an upstream status error.
    pub fn upstream(context: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            context: context.into(),
            status,
        }
    }

    /// Create a decode error with context.
    pub fn decode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create an object store error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Whether this error means "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_includes_status() {
        let err = AppError::upstream("listing", 503);
        assert_eq!(err.to_string(), "Upstream error for listing: HTTP 503");
    }

    #[test]
    fn test_is_not_found() {
        assert!(AppError::not_found("events.json").is_not_found());
        assert!(!AppError::parse("empty").is_not_found());
    }
}
