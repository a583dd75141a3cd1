// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
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

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regex compilation failed
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed year specification
    #[error("Invalid year spec '{input}': {message}")]
    YearSpec { input: String, message: String },

    /// Required credential missing from the environment
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(String),

    /// Upstream answered with a non-success HTTP status
    #[error("HTTP {status} from {context}")]
    Status { status: u16, context: String },

    /// Upstream signalled a rate limit
    #[error("Rate limited by upstream")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Upstream reported a failure in its response body
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A page could not be fetched within the retry bound
    #[error("Year {year} page {page}: gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        year: u32,
        page: u32,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    /// Operator interrupt
    #[error("Interrupted")]
    Interrupted,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a year spec error.
    pub fn year_spec(input: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::YearSpec {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Create an HTTP status error.
    pub fn status(status: u16, context: impl Into<String>) -> Self {
        Self::Status {
            status,
            context: context.into(),
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, bodies cut off mid-read, 5xx and rate
    /// limits are transient. Everything else fails the page immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Whether this error aborts the run before any fetching.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::YearSpec { .. }
                | Self::MissingCredential(_)
                | Self::Toml(_)
                | Self::Url(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(AppError::status(503, "search").is_transient());
        assert!(AppError::status(500, "search").is_transient());
        assert!(AppError::status(429, "search").is_transient());
        assert!(!AppError::status(404, "search").is_transient());
        assert!(!AppError::status(401, "search").is_transient());
    }

    #[test]
    fn test_non_network_errors_are_fatal() {
        assert!(AppError::RateLimited { retry_after_secs: None }.is_transient());
        assert!(!AppError::Upstream("bad app id".into()).is_transient());
        assert!(!AppError::Interrupted.is_transient());
        assert!(!AppError::config("x").is_transient());

        let json = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(!AppError::Json(json).is_transient());
    }

    #[test]
    fn test_exhausted_message_includes_cause() {
        let err = AppError::RetriesExhausted {
            year: 1982,
            page: 1,
            attempts: 4,
            source: Box::new(AppError::status(503, "search")),
        };
        let msg = err.to_string();
        assert!(msg.contains("1982"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn test_configuration_errors() {
        assert!(AppError::year_spec("19x", "not a number").is_configuration());
        assert!(AppError::MissingCredential("EBAY_APP_ID".into()).is_configuration());
        assert!(!AppError::Interrupted.is_configuration());
    }
}
