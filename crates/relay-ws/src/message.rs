//! WebSocket frame types
//!
//! Inbound: `{"content": "..."}`. Outbound: `{"type": "response", "content": "..."}`.

use serde::{Deserialize, Serialize};

use relay_core::Error;

/// Frame sent by the client
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub content: String,
}

impl InboundFrame {
    /// Decode a text frame; any decode failure is a bad request
    pub fn parse(text: &str) -> relay_core::Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::BadRequest(format!("Invalid frame: {}", e)))
    }
}

/// Frame sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Generated reply
    Response { content: String },
}

impl OutboundFrame {
    pub fn response(content: impl Into<String>) -> Self {
        Self::Response {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_extra_fields() {
        let frame = InboundFrame::parse(r#"{"content":"Hello","client_id":"x","ts":1}"#).unwrap();
        assert_eq!(frame.content, "Hello");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["not json", r#"{"message":"Hello"}"#, r#"{"content":42}"#, ""] {
            let err = InboundFrame::parse(text).unwrap_err();
            assert!(err.is_client_error(), "{:?} should be a bad request", text);
        }
    }

    #[test]
    fn test_serialize_response() {
        let json = serde_json::to_string(&OutboundFrame::response("Hi there!")).unwrap();
        assert_eq!(json, r#"{"type":"response","content":"Hi there!"}"#);
    }
}
