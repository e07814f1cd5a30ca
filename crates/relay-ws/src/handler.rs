//! WebSocket connection handler
//!
//! Connection lifecycle: register with the session store, relay frames one
//! at a time until the peer closes or an error occurs, then unregister.

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{debug, error, info, warn};

use relay_core::{Error, RelayHandler};

use crate::message::{InboundFrame, OutboundFrame};
use crate::{Result, WsError};

/// Handle WebSocket upgrade request for `/ws/{client_id}`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(relay): State<RelayHandler>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, relay))
}

/// Handle established WebSocket connection
async fn handle_socket(mut socket: WebSocket, client_id: String, relay: RelayHandler) {
    let handle = relay.store().register_connection(&client_id);
    info!("New WebSocket connection {} for client: {}", handle, client_id);

    match run_connection(&mut socket, &client_id, &relay).await {
        Ok(()) => info!("Client closed connection {} ({})", handle, client_id),
        Err(e) => {
            error!("Connection {} for client {} failed: {}", handle, client_id, e);
            let close = CloseFrame {
                code: e.close_code(),
                reason: truncate_reason(&e.to_string()).into(),
            };
            if let Err(send_err) = socket.send(WsMessage::Close(Some(close))).await {
                debug!("Could not send close frame on {}: {}", handle, send_err);
            }
        }
    }

    relay.store().unregister_connection(handle);
}

/// Receive-relay-reply loop; returns once the peer closes
async fn run_connection(socket: &mut WebSocket, client_id: &str, relay: &RelayHandler) -> Result<()> {
    while let Some(msg) = socket.recv().await {
        match msg? {
            WsMessage::Text(text) => {
                let reply = handle_frame(text.as_str(), client_id, relay).await?;
                socket.send(WsMessage::Text(reply.into())).await?;
            }
            WsMessage::Binary(_) => {
                return Err(WsError::Core(Error::BadRequest(
                    "Binary frames are not supported".to_string(),
                )));
            }
            WsMessage::Close(frame) => {
                debug!("Close frame from client {}: {:?}", client_id, frame);
                return Ok(());
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
        }
    }

    warn!("Client {} dropped the connection without a close frame", client_id);
    Ok(())
}

/// Relay one text frame and encode the reply frame
async fn handle_frame(text: &str, client_id: &str, relay: &RelayHandler) -> Result<String> {
    let frame = InboundFrame::parse(text)?;
    let reply = relay.relay(client_id, frame.content).await?;
    Ok(serde_json::to_string(&OutboundFrame::response(reply))?)
}

/// Close reasons must fit in a control frame (123 bytes)
fn truncate_reason(reason: &str) -> String {
    const MAX: usize = 123;
    if reason.len() <= MAX {
        return reason.to_string();
    }
    let mut end = MAX;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    reason[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::{SinkExt, StreamExt};
    use relay_core::{CompletionProvider, ConversationTurn, ProviderMessage, SessionStore};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;

    /// Replies with the last message, or fails when asked to
    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(&self, messages: &[ProviderMessage]) -> relay_core::Result<String> {
            let last = messages.last().map(|m| m.content()).unwrap_or_default();
            if last == "fail" {
                return Err(Error::Upstream("provider unavailable".to_string()));
            }
            Ok(format!("echo: {} ({} in context)", last, messages.len()))
        }
    }

    async fn spawn_server() -> (SocketAddr, RelayHandler) {
        let relay = RelayHandler::new(Arc::new(SessionStore::new()), Arc::new(EchoProvider));
        let app = crate::routes().with_state(relay.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, relay)
    }

    async fn wait_for_no_connections(relay: &RelayHandler) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while relay.store().connection_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("connection was not unregistered");
    }

    #[test]
    fn test_truncate_reason() {
        assert_eq!(truncate_reason("short"), "short");
        let long = "é".repeat(100);
        let truncated = truncate_reason(&long);
        assert!(truncated.len() <= 123);
        assert!(long.starts_with(&truncated));
    }

    #[tokio::test]
    async fn test_round_trip_and_cleanup() {
        let (addr, relay) = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/c1", addr))
            .await
            .unwrap();

        ws.send(ClientMessage::text(r#"{"content":"hello"}"#)).await.unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let frame: OutboundFrame = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(frame, OutboundFrame::response("echo: hello (1 in context)"));
        assert_eq!(relay.store().connection_count(), 1);

        ws.send(ClientMessage::text(r#"{"content":"again"}"#)).await.unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let frame: OutboundFrame = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(frame, OutboundFrame::response("echo: again (3 in context)"));

        ws.close(None).await.unwrap();
        wait_for_no_connections(&relay).await;
        assert_eq!(relay.history("c1").len(), 4);
    }

    #[tokio::test]
    async fn test_connect_creates_empty_transcript() {
        let (addr, relay) = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/fresh%20client", addr))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while relay.store().client_count() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(relay.history("fresh client").is_empty());

        ws.close(None).await.unwrap();
        wait_for_no_connections(&relay).await;
    }

    #[tokio::test]
    async fn test_malformed_frame_closes_connection() {
        let (addr, relay) = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/c2", addr))
            .await
            .unwrap();

        ws.send(ClientMessage::text(r#"{"message":"no content field"}"#))
            .await
            .unwrap();

        let mut close_code = None;
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                ClientMessage::Close(frame) => {
                    close_code = frame.map(|f| u16::from(f.code));
                }
                other => panic!("unexpected frame: {:?}", other),
            }
        }
        assert_eq!(close_code, Some(1007));

        wait_for_no_connections(&relay).await;
        assert!(relay.history("c2").is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_closes_and_keeps_user_turn() {
        let (addr, relay) = spawn_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/c3", addr))
            .await
            .unwrap();

        ws.send(ClientMessage::text(r#"{"content":"fail"}"#)).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            assert!(msg.is_close(), "unexpected frame: {:?}", msg);
        }

        wait_for_no_connections(&relay).await;
        assert_eq!(relay.history("c3"), vec![ConversationTurn::user("fail")]);
    }
}
