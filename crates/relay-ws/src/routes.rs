//! Route definitions

use axum::{Router, routing::get};

use relay_core::RelayHandler;

use crate::handler::websocket_handler;

/// Create the WebSocket router
pub fn routes() -> Router<RelayHandler> {
    Router::new().route("/ws/{client_id}", get(websocket_handler))
}
