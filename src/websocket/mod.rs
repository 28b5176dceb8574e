//! WebSocket transport for the realtime playground endpoint.
//!
//! This module provides the wire frame model and a WebSocket client with
//! automatic reconnection. Higher layers (connection manager, router, chat)
//! only see [`Frame`]s and the shared [`WsConnectionState`].

pub mod backoff;
pub mod client;
pub mod messages;

pub use backoff::ReconnectPolicy;
pub use client::{WsClient, WsClientConfig, WsConnectionState, WsError};
pub use messages::{
    ChannelPayload, ChatErrorPayload, ChatMessagePayload, ChatResponsePayload, ConnectedPayload,
    Frame, FrameType,
};
