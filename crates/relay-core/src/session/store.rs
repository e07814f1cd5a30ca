//! In-memory session store
//!
//! Thread-safe transcript and connection storage using DashMap.
//!
//! Retention: transcripts, per-client locks and connection bookkeeping live
//! for the lifetime of the process. Nothing is evicted or truncated, so memory
//! grows with the number of clients and the length of their conversations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::session::{ConnectionHandle, ConversationTurn};

/// Owns every transcript and the set of open persistent connections
#[derive(Default)]
pub struct SessionStore {
    /// Transcripts keyed by client identifier
    transcripts: DashMap<String, Vec<ConversationTurn>>,
    /// Open persistent connections and the client they belong to
    connections: DashMap<ConnectionHandle, String>,
    /// Per-client serialization points
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new persistent connection for a client and return its handle
    pub fn register_connection(&self, client_id: &str) -> ConnectionHandle {
        let handle = ConnectionHandle::new();
        self.register_connection_with(client_id, handle);
        handle
    }

    /// Record an open connection under a caller-supplied handle.
    ///
    /// Ensures a transcript exists for `client_id`.
    pub fn register_connection_with(&self, client_id: &str, handle: ConnectionHandle) {
        self.transcripts.entry(client_id.to_string()).or_default();
        self.connections.insert(handle, client_id.to_string());
        info!("Connection {} registered for client: {}", handle, client_id);
    }

    /// Forget a connection. Returns false if it was not registered.
    pub fn unregister_connection(&self, handle: ConnectionHandle) -> bool {
        match self.connections.remove(&handle) {
            Some((_, client_id)) => {
                info!("Connection {} unregistered for client: {}", handle, client_id);
                true
            }
            None => {
                debug!("Connection {} was not registered", handle);
                false
            }
        }
    }

    /// Whether a connection handle is currently registered
    pub fn is_connected(&self, handle: ConnectionHandle) -> bool {
        self.connections.contains_key(&handle)
    }

    /// Number of open persistent connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of clients with a transcript
    pub fn client_count(&self) -> usize {
        self.transcripts.len()
    }

    /// Append a turn, creating the transcript if needed
    pub fn append_turn(&self, client_id: &str, turn: ConversationTurn) {
        let mut transcript = self.transcripts.entry(client_id.to_string()).or_default();
        transcript.push(turn);
        debug!(
            "Appended {} turn for client {} ({} turns)",
            transcript.last().map(|t| t.role.as_str()).unwrap_or_default(),
            client_id,
            transcript.len()
        );
    }

    /// Snapshot of a client's transcript (empty if never seen)
    pub fn get_transcript(&self, client_id: &str) -> Vec<ConversationTurn> {
        self.transcripts
            .get(client_id)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }

    /// Replace a client's transcript with an empty one
    pub fn reset_transcript(&self, client_id: &str) {
        self.transcripts.insert(client_id.to_string(), Vec::new());
        info!("Reset transcript for client: {}", client_id);
    }

    /// Acquire the serialization point for a client.
    ///
    /// Holders for the same client run one at a time; different clients do
    /// not contend.
    pub async fn client_lock(&self, client_id: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(client_id.to_string()).or_default());
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unseen_client_is_empty() {
        let store = SessionStore::new();
        assert!(store.get_transcript("nobody").is_empty());
        assert_eq!(store.client_count(), 0);
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::new();
        let turns = vec![
            ConversationTurn::user("one"),
            ConversationTurn::assistant("two"),
            ConversationTurn::user("three"),
            ConversationTurn::user("four"),
        ];
        for turn in &turns {
            store.append_turn("c1", turn.clone());
        }
        assert_eq!(store.get_transcript("c1"), turns);
    }

    #[test]
    fn test_transcripts_are_isolated() {
        let store = SessionStore::new();
        store.append_turn("a", ConversationTurn::user("for a"));
        store.append_turn("b", ConversationTurn::user("for b"));

        assert_eq!(store.get_transcript("a"), vec![ConversationTurn::user("for a")]);
        assert_eq!(store.get_transcript("b"), vec![ConversationTurn::user("for b")]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = SessionStore::new();
        store.append_turn("c1", ConversationTurn::user("hello"));
        let snapshot = store.get_transcript("c1");
        store.append_turn("c1", ConversationTurn::assistant("hi"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get_transcript("c1").len(), 2);
    }

    #[test]
    fn test_reset_clears_existing_and_unseen() {
        let store = SessionStore::new();
        for i in 0..4 {
            store.append_turn("c1", ConversationTurn::user(format!("msg {}", i)));
        }
        store.reset_transcript("c1");
        store.reset_transcript("never-seen");

        assert!(store.get_transcript("c1").is_empty());
        assert!(store.get_transcript("never-seen").is_empty());
        assert_eq!(store.client_count(), 2);
    }

    #[test]
    fn test_register_creates_transcript_once() {
        let store = SessionStore::new();
        store.append_turn("c1", ConversationTurn::user("kept"));

        let first = store.register_connection("c1");
        let second = store.register_connection("c1");

        assert_ne!(first, second);
        assert_eq!(store.connection_count(), 2);
        assert_eq!(store.get_transcript("c1").len(), 1);

        store.register_connection("fresh");
        assert_eq!(store.client_count(), 2);
        assert!(store.get_transcript("fresh").is_empty());
    }

    #[test]
    fn test_unregister_is_safe_to_repeat() {
        let store = SessionStore::new();
        let handle = store.register_connection("c1");
        assert!(store.is_connected(handle));

        assert!(store.unregister_connection(handle));
        assert!(!store.unregister_connection(handle));
        assert!(!store.unregister_connection(ConnectionHandle::new()));
        assert!(!store.is_connected(handle));
        assert_eq!(store.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_client_lock_serializes_same_client() {
        let store = Arc::new(SessionStore::new());
        let guard = store.client_lock("c1").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.client_lock("c1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        // Other clients are not blocked
        let other = tokio::time::timeout(Duration::from_secs(1), store.client_lock("c2")).await;
        assert!(other.is_ok());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }
}
