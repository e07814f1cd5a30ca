//! relay-core: Chat Relay Core Library
//!
//! Per-client conversation transcripts, the completion-provider boundary,
//! and the relay algorithm shared by every transport.

pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
pub mod session;

pub use config::{Config, LlmConfig, LlmProvider, ServerConfig};
pub use error::{Error, Result};
pub use llm::{CompletionProvider, LlmClient, ProviderMessage};
pub use relay::RelayHandler;
pub use session::{ConnectionHandle, ConversationTurn, Role, SessionStore};
