//! Completion provider abstraction

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{ConversationTurn, Role};

/// One unit of conversational context handed to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderMessage {
    /// Human input
    Human(String),
    /// AI output
    Ai(String),
}

impl ProviderMessage {
    pub fn content(&self) -> &str {
        match self {
            Self::Human(text) | Self::Ai(text) => text,
        }
    }

    /// Chat-completion role name for this message
    pub fn role(&self) -> &'static str {
        match self {
            Self::Human(_) => "user",
            Self::Ai(_) => "assistant",
        }
    }
}

impl From<&ConversationTurn> for ProviderMessage {
    fn from(turn: &ConversationTurn) -> Self {
        match turn.role {
            Role::User => Self::Human(turn.content.clone()),
            Role::Assistant => Self::Ai(turn.content.clone()),
        }
    }
}

impl From<ProviderMessage> for ConversationTurn {
    fn from(message: ProviderMessage) -> Self {
        match message {
            ProviderMessage::Human(text) => ConversationTurn::user(text),
            ProviderMessage::Ai(text) => ConversationTurn::assistant(text),
        }
    }
}

/// Convert a transcript into provider input, preserving order
pub fn to_provider_input(transcript: &[ConversationTurn]) -> Vec<ProviderMessage> {
    transcript.iter().map(ProviderMessage::from).collect()
}

/// A service that maps an ordered conversation to generated text.
///
/// Failures must be reported as `Error::Upstream`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate the next assistant message for `messages`
    async fn complete(&self, messages: &[ProviderMessage]) -> Result<String>;
}
