//! LLM completion provider module
//!
//! The provider boundary used by the relay and its HTTP implementation.

mod client;
mod provider;
mod types;

pub use client::LlmClient;
pub use provider::{CompletionProvider, ProviderMessage, to_provider_input};
pub use types::*;
