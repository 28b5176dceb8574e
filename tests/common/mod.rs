//! Common test utilities for integration tests.
//!
//! This module provides fixtures for wiring a [`ConnectionManager`] to a
//! [`MockWebSocket`] and helpers for building server frames.
//!
//! # Example
//!
//! ```ignore
//! let fixture = Fixture::connected();
//! let chat = fixture.chat(Some("ep-1"));
//! fixture.manager.dispatch(&chat_response(&id, "Hi!", None, None));
//! ```

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;

use playground_realtime::chat::{ChatConfig, PlaygroundChat};
use playground_realtime::connection::ConnectionManager;
use playground_realtime::websocket::{Frame, FrameType};
use serde_json::json;

/// A manager wired to a mock socket.
pub struct Fixture {
    pub socket: MockWebSocket,
    pub manager: Arc<ConnectionManager>,
}

impl Fixture {
    pub fn connected() -> Self {
        Self::with_socket(MockWebSocket::new())
    }

    #[allow(dead_code)]
    pub fn disconnected() -> Self {
        Self::with_socket(MockWebSocket::disconnected())
    }

    fn with_socket(socket: MockWebSocket) -> Self {
        let manager = ConnectionManager::new(Arc::new(socket.clone()));
        Self { socket, manager }
    }

    #[allow(dead_code)]
    pub fn chat(&self, endpoint_id: Option<&str>) -> PlaygroundChat {
        self.chat_with(endpoint_id, ChatConfig::default())
    }

    #[allow(dead_code)]
    pub fn chat_with(&self, endpoint_id: Option<&str>, config: ChatConfig) -> PlaygroundChat {
        PlaygroundChat::new(&self.manager, endpoint_id.map(String::from), config)
    }

    /// Frames of `frame_type` the client has sent so far.
    #[allow(dead_code)]
    pub fn sent_of(&self, frame_type: FrameType) -> Vec<Frame> {
        self.socket
            .sent_frames()
            .into_iter()
            .filter(|frame| frame.frame_type == frame_type)
            .collect()
    }
}

#[allow(dead_code)]
pub fn chat_response(
    correlation_id: &str,
    output: &str,
    trace_id: Option<&str>,
    session_id: Option<&str>,
) -> Frame {
    let mut payload = json!({ "output": output });
    if let Some(trace_id) = trace_id {
        payload["trace_id"] = json!(trace_id);
    }
    if let Some(session_id) = session_id {
        payload["session_id"] = json!(session_id);
    }
    Frame::new(FrameType::ChatResponse, payload).with_correlation_id(correlation_id)
}

#[allow(dead_code)]
pub fn chat_error(correlation_id: &str, error: &str) -> Frame {
    Frame::new(FrameType::ChatError, json!({ "error": error })).with_correlation_id(correlation_id)
}

#[allow(dead_code)]
pub fn connected(connection_id: &str) -> Frame {
    Frame::new(FrameType::Connected, json!({ "connection_id": connection_id }))
}
