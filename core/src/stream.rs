//! Wire types for the generation stream.
//!
//! A generation request carries the serialized document snapshot; the source
//! answers with an ordered sequence of messages whose `content` grows
//! monotonically until the terminal `Complete` message. Responses echo the id
//! of the request that produced them, which is how the controller discards
//! chunks of superseded streams.

use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Whether more content is still expected for this response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Streaming,
    Complete,
}

/// One message of a streamed generation response.
///
/// `content` is the full accumulated text so far, not a delta, and is not
/// guaranteed well-formed; the controller unwraps stray quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub response_id: String,
    pub role: Role,
    pub content: String,
    pub status: StreamStatus,
}

impl StreamMessage {
    pub fn new<I, C>(response_id: I, role: Role, content: C, status: StreamStatus) -> Self
    where
        I: Into<String>,
        C: Into<String>,
    {
        Self {
            response_id: response_id.into(),
            role,
            content: content.into(),
            status,
        }
    }
}

/// A request for a fresh completion, issued after a quiet period of edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Identity the response stream must echo.
    pub id: String,
    /// Serialized document snapshot (JSON).
    pub snapshot: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn test_stream_message_round_trip() {
        let msg = StreamMessage::new("req-1", Role::Assistant, " hi", StreamStatus::Streaming);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: StreamMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
