//! relay-ws: WebSocket transport for the chat relay
//!
//! One long-lived connection per client session. Each text frame is relayed
//! to the completion provider and answered with exactly one frame.

pub mod error;
pub mod handler;
pub mod message;
pub mod routes;

pub use error::{Result, WsError};
pub use handler::websocket_handler;
pub use message::{InboundFrame, OutboundFrame};
pub use routes::routes;
