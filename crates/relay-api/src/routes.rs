//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use relay_core::RelayHandler;

use crate::handlers::{chat, health, history, reset, root};

/// Create the API router
pub fn routes() -> Router<RelayHandler> {
    Router::new()
        // Liveness
        .route("/", get(root))
        .route("/health", get(health))
        // Single-call chat
        .route("/chat", post(chat))
        // Transcript management
        .route("/history/{client_id}", get(history))
        .route("/reset/{client_id}", post(reset))
}
