// src/error.rs

//! Unified error handling for the catalog monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed (connect, timeout, decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request completed with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Bot API answered with `ok: false`
    #[error("Telegram {method} failed: {description}")]
    Telegram { method: String, description: String },

    /// Page 0 could not be fetched, so nothing is known this cycle
    #[error("Catalog metadata unavailable")]
    MetadataUnavailable,

    /// Metadata reported items but the full fetch produced none
    #[error("Audit incomplete: metadata reported {expected} items but no products were fetched")]
    IncompleteAudit { expected: u64 },

    /// Notification delivery error
    #[error("Notification error: {0}")]
    Notify(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
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

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a Bot API error for the given method.
    pub fn telegram(method: impl Into<String>, description: impl fmt::Display) -> Self {
        Self::Telegram {
            method: method.into(),
            description: description.to_string(),
        }
    }
}
