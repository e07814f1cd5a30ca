//! Error types for relay-ws

use axum::extract::ws::close_code;
use thiserror::Error;

/// WebSocket error type
#[derive(Error, Debug)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] axum::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] relay_core::Error),
}

impl WsError {
    /// Close code reported to the peer when this error ends a connection
    pub fn close_code(&self) -> u16 {
        match self {
            Self::Core(e) if e.is_client_error() => close_code::INVALID,
            _ => close_code::ERROR,
        }
    }
}

/// Result type alias for relay-ws
pub type Result<T> = std::result::Result<T, WsError>;
