use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame type tag carried in the `type` field of every frame.
///
/// Known types get their own variant; anything else the server pushes is
/// kept verbatim in [`FrameType::Other`] so it can still be routed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FrameType {
    /// Outbound chat request
    ChatMessage,
    /// Inbound answer to a chat request
    ChatResponse,
    /// Inbound failure for a chat request
    ChatError,
    /// Server greeting carrying the connection id
    Connected,
    Ping,
    Pong,
    /// Channel subscribe control frame
    Subscribe,
    /// Channel unsubscribe control frame
    Unsubscribe,
    /// Any other server event type
    Other(String),
}

impl FrameType {
    pub fn as_str(&self) -> &str {
        match self {
            FrameType::ChatMessage => "CHAT_MESSAGE",
            FrameType::ChatResponse => "CHAT_RESPONSE",
            FrameType::ChatError => "CHAT_ERROR",
            FrameType::Connected => "CONNECTED",
            FrameType::Ping => "PING",
            FrameType::Pong => "PONG",
            FrameType::Subscribe => "SUBSCRIBE",
            FrameType::Unsubscribe => "UNSUBSCRIBE",
            FrameType::Other(name) => name,
        }
    }
}

impl From<&str> for FrameType {
    fn from(value: &str) -> Self {
        match value {
            "CHAT_MESSAGE" => FrameType::ChatMessage,
            "CHAT_RESPONSE" => FrameType::ChatResponse,
            "CHAT_ERROR" => FrameType::ChatError,
            "CONNECTED" => FrameType::Connected,
            "PING" => FrameType::Ping,
            "PONG" => FrameType::Pong,
            "SUBSCRIBE" => FrameType::Subscribe,
            "UNSUBSCRIBE" => FrameType::Unsubscribe,
            other => FrameType::Other(other.to_string()),
        }
    }
}

impl From<String> for FrameType {
    fn from(value: String) -> Self {
        FrameType::from(value.as_str())
    }
}

impl From<FrameType> for String {
    fn from(value: FrameType) -> Self {
        match value {
            FrameType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A single JSON message exchanged over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

impl Frame {
    pub fn new(frame_type: FrameType, payload: Value) -> Self {
        Self {
            frame_type,
            correlation_id: None,
            payload,
        }
    }

    /// Frame with an empty `{}` payload.
    pub fn bare(frame_type: FrameType) -> Self {
        Self::new(frame_type, empty_payload())
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Build a frame from any serializable payload.
    pub fn with_payload<T: Serialize>(
        frame_type: FrameType,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(frame_type, serde_json::to_value(payload)?))
    }

    /// Outbound `CHAT_MESSAGE` frame tagged with its correlation id.
    pub fn chat_message(
        correlation_id: impl Into<String>,
        payload: &ChatMessagePayload,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::with_payload(FrameType::ChatMessage, payload)?.with_correlation_id(correlation_id))
    }

    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self::new(
            FrameType::Subscribe,
            serde_json::json!({ "channel": channel.into() }),
        )
    }

    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        Self::new(
            FrameType::Unsubscribe,
            serde_json::json!({ "channel": channel.into() }),
        )
    }

    pub fn ping() -> Self {
        Self::bare(FrameType::Ping)
    }

    pub fn pong() -> Self {
        Self::bare(FrameType::Pong)
    }

    /// Decode the payload into a typed struct.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// True when this frame answers the request tagged `correlation_id`.
    pub fn correlates_with(&self, correlation_id: &str) -> bool {
        self.correlation_id.as_deref() == Some(correlation_id)
    }
}

/// Payload of an outbound `CHAT_MESSAGE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub endpoint_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Payload of an inbound `CHAT_RESPONSE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponsePayload {
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Payload of an inbound `CHAT_ERROR`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatErrorPayload {
    pub error: String,
}

/// Server greeting sent right after the socket opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub connection_id: String,
}

/// Payload of `SUBSCRIBE` / `UNSUBSCRIBE` control frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub channel: String,
}
