//! Tungstenite-based WebSocket adapter.
//!
//! This module provides a WebSocket connection implementation that wraps
//! [`WsClient`] and implements the [`WebSocketConnection`] trait, plus the
//! [`TungsteniteConnector`] used by the connection provider.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::traits::{Connector, WebSocketConnection};
use crate::websocket::{Frame, WsClient, WsClientConfig, WsConnectionState, WsError};

/// WebSocket connection adapter using tokio-tungstenite.
///
/// # Example
///
/// ```ignore
/// use playground_realtime::adapters::TungsteniteWsConnection;
/// use playground_realtime::traits::WebSocketConnection;
/// use playground_realtime::websocket::{Frame, WsClientConfig};
///
/// let connection = TungsteniteWsConnection::connect(WsClientConfig::default()).await?;
/// let mut rx = connection.subscribe();
/// connection.send(Frame::ping())?;
/// ```
pub struct TungsteniteWsConnection {
    client: WsClient,
}

impl TungsteniteWsConnection {
    /// Connect to a WebSocket server using the provided configuration.
    pub async fn connect(config: WsClientConfig) -> Result<Self, WsError> {
        let client = WsClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Connect with authentication.
    pub async fn connect_with_auth(
        config: WsClientConfig,
        token: &str,
    ) -> Result<Self, WsError> {
        Self::connect(config.with_auth(token)).await
    }
}

impl WebSocketConnection for TungsteniteWsConnection {
    fn send(&self, frame: Frame) -> Result<(), WsError> {
        self.client.try_send(frame)
    }

    fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.client.subscribe()
    }

    fn state(&self) -> watch::Receiver<WsConnectionState> {
        self.client.state_receiver()
    }

    fn shutdown(&self) {
        self.client.shutdown();
    }
}

/// Production [`Connector`] opening tungstenite connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(
        &self,
        config: &WsClientConfig,
    ) -> Result<Arc<dyn WebSocketConnection>, WsError> {
        let connection = TungsteniteWsConnection::connect(config.clone()).await?;
        Ok(Arc::new(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> WsClientConfig {
        WsClientConfig::default().with_host("127.0.0.1:59999")
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let result = TungsteniteWsConnection::connect(unreachable_config()).await;
        assert!(matches!(result, Err(WsError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_connect_with_auth_failure() {
        let result =
            TungsteniteWsConnection::connect_with_auth(unreachable_config(), "test-token").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connector_failure() {
        let result = TungsteniteConnector.connect(&unreachable_config()).await;
        assert!(matches!(result, Err(WsError::ConnectionFailed(_))));
    }
}
