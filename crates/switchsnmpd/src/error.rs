//! Error types for switchsnmpd

use std::time::Duration;
use thiserror::Error;

/// Daemon-level errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration file missing, malformed or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Listener bind failure
    #[error("Failed to bind {what} on {addr}: {source}")]
    Bind {
        /// Which listener failed ("SNMP agent", "metrics server")
        what: &'static str,
        /// Requested address
        addr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Prometheus registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from one collection cycle against one switch.
///
/// These never leave the collector: they are logged and the previous
/// snapshot is kept.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level HTTP failure (connect, reset, body read)
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Switch answered with a non-success status code
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Switch rejected the credentials or served the login page
    #[error("Authentication rejected by {address}")]
    Auth { address: String },

    /// Page could not be turned into port records
    #[error("Unparsable stats page: {0}")]
    Parse(String),

    /// Fetch exceeded its deadline
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http { .. } => "http",
            FetchError::Status { .. } => "status",
            FetchError::Auth { .. } => "auth",
            FetchError::Parse(_) => "parse",
            FetchError::Timeout(_) => "timeout",
        }
    }
}
