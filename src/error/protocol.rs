//! Errors decoding frames and payloads.

use std::fmt;

use crate::websocket::FrameType;

/// A frame or payload did not match the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Frame text was not valid JSON for a frame
    InvalidFrame { message: String },
    /// Payload of a known frame type failed to decode
    InvalidPayload { frame_type: FrameType, message: String },
}

impl ProtocolError {
    pub fn invalid_payload(frame_type: &FrameType, err: &serde_json::Error) -> Self {
        ProtocolError::InvalidPayload {
            frame_type: frame_type.clone(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidFrame { message } => write!(f, "Invalid frame: {}", message),
            ProtocolError::InvalidPayload { frame_type, message } => {
                write!(f, "Invalid {} payload: {}", frame_type, message)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::InvalidFrame {
            message: err.to_string(),
        }
    }
}
