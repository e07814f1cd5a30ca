//! relay-api: HTTP API for the chat relay
//!
//! Single-call chat, transcript history, reset and liveness endpoints.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, Result};
pub use routes::routes;
