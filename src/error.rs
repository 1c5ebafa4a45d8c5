// src/error.rs

//! Unified error handling for the collector application.

use std::fmt;

use thiserror::Error;

/// Result type alias for collector operations.
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

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// OPML/XML document parsing failed
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Upstream denied access to a URL (HTTP 403). Branch-local: the
    /// affected subtree is abandoned, the run continues after a cooldown.
    #[error("access denied (403): {0}")]
    AccessDenied(String),

    /// Upstream rate limit hit (HTTP 429). Branch-local, like `AccessDenied`.
    #[error("rate limited (429): {0}")]
    RateLimited(String),

    /// Unexpected HTTP status from an upstream source
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// An entire source adapter failed for this cycle
    #[error("adapter '{source_id}' failed: {message}")]
    Adapter { source_id: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("validation error: {0}")]
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

    /// Create an adapter-level failure with source context.
    pub fn adapter(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Adapter {
            source_id: source.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a branch-local traversal signal rather than
    /// an adapter-level failure.
    pub fn is_branch_local(&self) -> bool {
        matches!(self, Self::AccessDenied(_) | Self::RateLimited(_))
    }
}
