//! Error types for relay-core

use thiserror::Error;

/// Main error type for relay-core
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound payload could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Completion provider failed (network, auth, quota, malformed response)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Startup configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure was caused by the caller's payload
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

/// Result type alias for relay-core
pub type Result<T> = std::result::Result<T, Error>;
