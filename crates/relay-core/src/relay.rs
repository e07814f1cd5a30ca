//! Relay handler
//!
//! Transport-independent message relay: record the user turn, ask the
//! completion provider for a reply over the whole transcript, and record
//! the reply.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::Result;
use crate::llm::{CompletionProvider, to_provider_input};
use crate::session::{ConversationTurn, SessionStore};

/// Shared relay logic for every transport
#[derive(Clone)]
pub struct RelayHandler {
    store: Arc<SessionStore>,
    provider: Arc<dyn CompletionProvider>,
}

impl RelayHandler {
    pub fn new(store: Arc<SessionStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { store, provider }
    }

    /// Session store backing this handler
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Relay one user message and return the generated reply.
    ///
    /// Runs under the client's lock, so concurrent messages for one client
    /// are answered in arrival order. On provider failure the user turn stays
    /// in the transcript without an answer.
    pub async fn relay(&self, client_id: &str, content: String) -> Result<String> {
        let _guard = self.store.client_lock(client_id).await;

        self.store.append_turn(client_id, ConversationTurn::user(content));
        let transcript = self.store.get_transcript(client_id);
        let messages = to_provider_input(&transcript);

        debug!(
            "Relaying {} messages of context for client: {}",
            messages.len(),
            client_id
        );

        let reply = match self.provider.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Completion failed for client {}: {}", client_id, e);
                return Err(e);
            }
        };

        self.store
            .append_turn(client_id, ConversationTurn::assistant(reply.clone()));
        info!("Relayed reply to client {} ({} chars)", client_id, reply.len());

        Ok(reply)
    }

    /// Full transcript for a client, in stored order
    pub fn history(&self, client_id: &str) -> Vec<ConversationTurn> {
        self.store.get_transcript(client_id)
    }

    /// Clear a client's transcript once any in-flight relay for it finishes
    pub async fn reset(&self, client_id: &str) {
        let _guard = self.store.client_lock(client_id).await;
        self.store.reset_transcript(client_id);
    }
}
