//! WebSocket connection trait abstraction.
//!
//! Provides a trait-based abstraction for WebSocket operations, enabling
//! dependency injection and mocking in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::websocket::{Frame, WsClientConfig, WsConnectionState, WsError};

/// Trait for WebSocket connection operations.
///
/// The connection manager only talks to the socket through this trait, so a
/// [`MockWebSocket`](crate::adapters::MockWebSocket) can stand in for the
/// real transport in tests.
///
/// # Example
///
/// ```ignore
/// use playground_realtime::traits::WebSocketConnection;
/// use playground_realtime::websocket::Frame;
///
/// fn greet<C: WebSocketConnection>(conn: &C) {
///     let mut rx = conn.subscribe();
///     if conn.send(Frame::ping()).is_err() {
///         // not connected
///     }
/// }
/// ```
pub trait WebSocketConnection: Send + Sync {
    /// Queue a frame for the server.
    ///
    /// Never blocks: fails straight away when the socket is not open.
    fn send(&self, frame: Frame) -> Result<(), WsError>;

    /// Subscribe to inbound frames.
    ///
    /// Returns a broadcast receiver that will receive copies of all
    /// incoming frames. Multiple subscribers can exist simultaneously.
    fn subscribe(&self) -> broadcast::Receiver<Frame>;

    /// Get a receiver for connection state changes.
    fn state(&self) -> watch::Receiver<WsConnectionState>;

    /// Gracefully shutdown the connection.
    fn shutdown(&self);
}

/// Opens connections; one call per authenticated session.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &WsClientConfig,
    ) -> Result<Arc<dyn WebSocketConnection>, WsError>;
}
