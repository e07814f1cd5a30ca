//! HTTP API handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use relay_core::{ConversationTurn, RelayHandler};

use crate::Result;

// ============================================================================
// Request/Response types
// ============================================================================

/// Chat request payload
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message
    pub content: String,
    /// Conversation the message belongs to
    pub client_id: String,
}

/// Chat response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Transcript payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<ConversationTurn>,
}

/// Plain acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

// ============================================================================
// Handler functions
// ============================================================================

/// Liveness endpoint
pub async fn root() -> Json<MessageResponse> {
    MessageResponse::new("Agent Chat API is running")
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Chat endpoint - relay one message and return the reply
pub async fn chat(
    State(relay): State<RelayHandler>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(req) = payload?;
    debug!("Chat request from client: {}", req.client_id);

    let response = relay.relay(&req.client_id, req.content).await?;
    Ok(Json(ChatResponse { response }))
}

/// Full transcript for a client
pub async fn history(
    State(relay): State<RelayHandler>,
    Path(client_id): Path<String>,
) -> Json<HistoryResponse> {
    debug!("History request: {}", client_id);
    Json(HistoryResponse {
        history: relay.history(&client_id),
    })
}

/// Reset a client's transcript
pub async fn reset(
    State(relay): State<RelayHandler>,
    Path(client_id): Path<String>,
) -> Json<MessageResponse> {
    relay.reset(&client_id).await;
    info!("Conversation reset: {}", client_id);
    MessageResponse::new("Conversation reset successfully")
}
