//! Mock WebSocket connection for testing.
//!
//! Provides a mock WebSocket that allows frame injection and
//! sent-frame verification for testing purposes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::connection::lock;
use crate::traits::{Connector, WebSocketConnection};
use crate::websocket::{Frame, WsClientConfig, WsConnectionState, WsError};

/// Mock WebSocket connection for testing.
///
/// This mock allows:
/// - Injecting incoming frames
/// - Capturing outgoing frames
/// - Controlling connection state
///
/// # Example
///
/// ```ignore
/// use playground_realtime::adapters::mock::MockWebSocket;
/// use playground_realtime::traits::WebSocketConnection;
/// use playground_realtime::websocket::Frame;
///
/// let mock = MockWebSocket::new();
/// let mut rx = mock.subscribe();
/// mock.inject_frame(Frame::ping());
///
/// mock.send(Frame::pong())?;
/// assert_eq!(mock.sent_frames().len(), 1);
/// ```
pub struct MockWebSocket {
    /// Broadcast sender for incoming frames
    incoming_tx: broadcast::Sender<Frame>,
    /// Watch sender for connection state
    state_tx: Arc<watch::Sender<WsConnectionState>>,
    /// Captured outgoing frames
    sent_frames: Arc<Mutex<Vec<Frame>>>,
    /// Whether send should fail
    send_should_fail: Arc<Mutex<bool>>,
}

impl MockWebSocket {
    /// Create a new mock WebSocket in connected state.
    pub fn new() -> Self {
        Self::with_state(WsConnectionState::Connected)
    }

    /// Create a new mock WebSocket in disconnected state.
    pub fn disconnected() -> Self {
        Self::with_state(WsConnectionState::Disconnected)
    }

    fn with_state(state: WsConnectionState) -> Self {
        let (incoming_tx, _) = broadcast::channel(100);
        let (state_tx, _) = watch::channel(state);

        Self {
            incoming_tx,
            state_tx: Arc::new(state_tx),
            sent_frames: Arc::new(Mutex::new(Vec::new())),
            send_should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Inject an incoming frame.
    ///
    /// The frame will be delivered to all subscribers.
    pub fn inject_frame(&self, frame: Frame) {
        // Ignore send errors (no subscribers)
        let _ = self.incoming_tx.send(frame);
    }

    /// Inject multiple incoming frames.
    pub fn inject_frames(&self, frames: Vec<Frame>) {
        for frame in frames {
            self.inject_frame(frame);
        }
    }

    /// Set the connection state.
    pub fn set_state(&self, state: WsConnectionState) {
        self.state_tx.send_replace(state);
    }

    pub fn current_state(&self) -> WsConnectionState {
        self.state_tx.borrow().clone()
    }

    /// Get all sent frames.
    pub fn sent_frames(&self) -> Vec<Frame> {
        lock(&self.sent_frames).clone()
    }

    /// Clear all sent frames.
    pub fn clear_sent_frames(&self) {
        lock(&self.sent_frames).clear();
    }

    /// Configure whether send should fail.
    pub fn set_send_should_fail(&self, should_fail: bool) {
        *lock(&self.send_should_fail) = should_fail;
    }

    /// Simulate a disconnection.
    pub fn simulate_disconnect(&self) {
        self.set_state(WsConnectionState::Disconnected);
    }

    /// Simulate a reconnection attempt.
    pub fn simulate_reconnecting(&self, attempt: u32) {
        self.set_state(WsConnectionState::Reconnecting { attempt });
    }

    /// Simulate a successful reconnection.
    pub fn simulate_reconnected(&self) {
        self.set_state(WsConnectionState::Connected);
    }

    /// Get the number of subscribers to incoming frames.
    pub fn subscriber_count(&self) -> usize {
        self.incoming_tx.receiver_count()
    }
}

impl Default for MockWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockWebSocket {
    fn clone(&self) -> Self {
        Self {
            incoming_tx: self.incoming_tx.clone(),
            state_tx: self.state_tx.clone(),
            sent_frames: self.sent_frames.clone(),
            send_should_fail: self.send_should_fail.clone(),
        }
    }
}

impl WebSocketConnection for MockWebSocket {
    fn send(&self, frame: Frame) -> Result<(), WsError> {
        if *lock(&self.send_should_fail) {
            return Err(WsError::SendFailed("Mock send failure".to_string()));
        }
        if *self.state_tx.borrow() != WsConnectionState::Connected {
            return Err(WsError::Disconnected);
        }

        lock(&self.sent_frames).push(frame);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.incoming_tx.subscribe()
    }

    fn state(&self) -> watch::Receiver<WsConnectionState> {
        self.state_tx.subscribe()
    }

    fn shutdown(&self) {
        self.set_state(WsConnectionState::Disconnected);
    }
}

/// [`Connector`] handing out clones of one [`MockWebSocket`].
#[derive(Clone, Default)]
pub struct MockConnector {
    socket: MockWebSocket,
    fail_with: Arc<Mutex<Option<WsError>>>,
    configs: Arc<Mutex<Vec<WsClientConfig>>>,
}

impl MockConnector {
    pub fn new(socket: MockWebSocket) -> Self {
        Self {
            socket,
            fail_with: Arc::new(Mutex::new(None)),
            configs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn socket(&self) -> &MockWebSocket {
        &self.socket
    }

    /// Make the next connects fail with `err` (`None` restores success).
    pub fn set_failure(&self, err: Option<WsError>) {
        *lock(&self.fail_with) = err;
    }

    /// Configs passed to `connect`, in call order.
    pub fn connect_calls(&self) -> Vec<WsClientConfig> {
        lock(&self.configs).clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        config: &WsClientConfig,
    ) -> Result<Arc<dyn WebSocketConnection>, WsError> {
        lock(&self.configs).push(config.clone());
        if let Some(err) = lock(&self.fail_with).clone() {
            return Err(err);
        }
        self.socket.simulate_reconnected();
        Ok(Arc::new(self.socket.clone()))
    }
}
