//! Session management module
//!
//! In-memory conversation transcripts and persistent-connection bookkeeping.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{ConnectionHandle, ConversationTurn, Role};
