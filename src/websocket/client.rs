use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::backoff::ReconnectPolicy;
use crate::error::ProtocolError;
use super::messages::{Frame, FrameType};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// WebSocket connection errors
#[derive(Debug, Clone, PartialEq)]
pub enum WsError {
    /// Connection failed
    ConnectionFailed(String),
    /// Disconnected from server
    Disconnected,
    /// Failed to queue or write a frame
    SendFailed(String),
    /// Failed to parse a frame
    ParseError(String),
    /// Connection timeout
    Timeout(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            WsError::Disconnected => write!(f, "Disconnected from server"),
            WsError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            WsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            WsError::Timeout(msg) => write!(f, "Connection timeout: {}", msg),
            WsError::Other(msg) => write!(f, "WebSocket error: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

/// WebSocket connection state
#[derive(Debug, Clone, PartialEq)]
pub enum WsConnectionState {
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
}

/// Configuration for WebSocket client
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Host and port of the realtime endpoint
    pub host: String,
    /// Socket path on the host
    pub path: String,
    /// Use `wss://` instead of `ws://`
    pub use_tls: bool,
    /// Session token, sent as the `token` query parameter
    pub auth_token: Option<String>,
    pub reconnect: ReconnectPolicy,
    /// Application-level PING interval; `None` disables keepalive
    pub ping_interval: Option<Duration>,
    /// Capacity of the outbound frame queue
    pub outbound_capacity: usize,
    /// Capacity of the inbound broadcast channel
    pub incoming_capacity: usize,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:8080".to_string(),
            path: "/ws".to_string(),
            use_tls: false,
            auth_token: None,
            reconnect: ReconnectPolicy::default(),
            ping_interval: Some(Duration::from_secs(25)),
            outbound_capacity: 100,
            incoming_capacity: 256,
        }
    }
}

impl WsClientConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_ping_interval(mut self, interval: Option<Duration>) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Full socket URL including the token query parameter.
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let base = format!("{}://{}{}", scheme, self.host, path);
        match &self.auth_token {
            Some(token) => format!("{}?token={}", base, urlencoding::encode(token)),
            None => base,
        }
    }

    /// URL safe for logging (token redacted).
    pub fn display_url(&self) -> String {
        let redacted = Self {
            auth_token: self.auth_token.as_ref().map(|_| "***".to_string()),
            ..self.clone()
        };
        redacted.url()
    }
}

/// WebSocket client for the realtime endpoint.
///
/// The socket itself lives in a background task; the client only holds
/// channel ends into it. Dropping the client shuts the task down.
pub struct WsClient {
    /// Queue of frames waiting to be written
    outbound_tx: mpsc::Sender<Frame>,
    /// Fan-out of parsed inbound frames
    incoming_tx: broadcast::Sender<Frame>,
    /// Receiver opened before the socket task started, handed to the first
    /// subscriber so frames sent right after the handshake are not lost
    first_rx: Mutex<Option<broadcast::Receiver<Frame>>>,
    /// Watch receiver for connection state changes
    state_rx: watch::Receiver<WsConnectionState>,
    /// Flag to signal shutdown
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl WsClient {
    /// Connect to the WebSocket server
    ///
    /// Returns a WsClient on success, or WsError if initial connection fails
    pub async fn connect(config: WsClientConfig) -> Result<Self, WsError> {
        let url = config.url();

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        info!("Connected to realtime server at {}", config.display_url());

        let (ws_sink, ws_source) = ws_stream.split();

        let (outbound_tx, outbound_rx) = mpsc::channel::<Frame>(config.outbound_capacity.max(1));
        let (incoming_tx, first_rx) = broadcast::channel::<Frame>(config.incoming_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(WsConnectionState::Connected);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_notify = Arc::new(Notify::new());

        let task = ConnectionTask {
            url,
            config,
            incoming_tx: incoming_tx.clone(),
            outbound_rx,
            state_tx,
            shutdown: shutdown.clone(),
            shutdown_notify: shutdown_notify.clone(),
        };
        tokio::spawn(task.run(ws_sink, ws_source));

        Ok(Self {
            outbound_tx,
            incoming_tx,
            first_rx: Mutex::new(Some(first_rx)),
            state_rx,
            shutdown,
            shutdown_notify,
        })
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(*self.state_rx.borrow(), WsConnectionState::Connected)
    }

    /// Get the current connection state
    pub fn connection_state(&self) -> WsConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to connection state changes
    pub fn state_receiver(&self) -> watch::Receiver<WsConnectionState> {
        self.state_rx.clone()
    }

    /// Subscribe to inbound frames.
    ///
    /// The first subscriber also sees frames received since connect.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.first_rx
            .lock()
            .ok()
            .and_then(|mut first| first.take())
            .unwrap_or_else(|| self.incoming_tx.subscribe())
    }

    /// Queue a frame without waiting.
    ///
    /// Fails immediately when the socket is not open or the queue is full.
    pub fn try_send(&self, frame: Frame) -> Result<(), WsError> {
        if self.shutdown.load(Ordering::SeqCst) || !self.is_connected() {
            return Err(WsError::Disconnected);
        }
        self.outbound_tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => WsError::SendFailed("outbound queue full".to_string()),
            TrySendError::Closed(_) => WsError::Disconnected,
        })
    }

    /// Gracefully shutdown the WebSocket connection
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            info!("Shutting down realtime client");
            self.shutdown_notify.notify_one();
        }
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum LoopEvent {
    Shutdown,
    Inbound(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Outbound(Option<Frame>),
    Keepalive,
}

/// Background task owning the socket.
struct ConnectionTask {
    url: String,
    config: WsClientConfig,
    incoming_tx: broadcast::Sender<Frame>,
    outbound_rx: mpsc::Receiver<Frame>,
    state_tx: watch::Sender<WsConnectionState>,
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl Drop for ConnectionTask {
    /// However the task ends (give-up, shutdown, panic), observers see
    /// `Disconnected` afterwards.
    fn drop(&mut self) {
        self.state_tx.send_replace(WsConnectionState::Disconnected);
    }
}

impl ConnectionTask {
    async fn run(mut self, mut ws_sink: WsSink, mut ws_source: WsSource) {
        let mut keepalive = self.config.ping_interval.and_then(keepalive_interval);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("Shutdown signal received, closing connection");
                let _ = ws_sink.close().await;
                break;
            }

            let event = tokio::select! {
                _ = self.shutdown_notify.notified() => LoopEvent::Shutdown,
                msg = ws_source.next() => LoopEvent::Inbound(msg),
                frame = self.outbound_rx.recv() => LoopEvent::Outbound(frame),
                _ = next_tick(&mut keepalive) => LoopEvent::Keepalive,
            };

            let connection_lost = match event {
                LoopEvent::Shutdown => continue,
                LoopEvent::Inbound(Some(Ok(Message::Text(text)))) => {
                    self.handle_text(&text, &mut ws_sink).await;
                    false
                }
                LoopEvent::Inbound(Some(Ok(Message::Ping(data)))) => {
                    debug!("Received ping, sending pong");
                    let _ = ws_sink.send(Message::Pong(data)).await;
                    false
                }
                LoopEvent::Inbound(Some(Ok(Message::Close(_)))) => {
                    info!("Received close frame from server");
                    true
                }
                LoopEvent::Inbound(Some(Ok(_))) => {
                    // Pong, Binary and raw frames carry nothing for us
                    false
                }
                LoopEvent::Inbound(Some(Err(e))) => {
                    error!("WebSocket error: {}", e);
                    true
                }
                LoopEvent::Inbound(None) => {
                    info!("WebSocket stream ended");
                    true
                }
                LoopEvent::Outbound(Some(frame)) => {
                    write_frame(&mut ws_sink, &frame).await;
                    false
                }
                LoopEvent::Outbound(None) => {
                    debug!("Outbound queue closed, shutting down");
                    let _ = ws_sink.close().await;
                    break;
                }
                LoopEvent::Keepalive => {
                    write_frame(&mut ws_sink, &Frame::ping()).await;
                    false
                }
            };

            if connection_lost {
                let _ = self.state_tx.send(WsConnectionState::Disconnected);
                match self.reconnect().await {
                    Some((new_sink, new_source)) => {
                        ws_sink = new_sink;
                        ws_source = new_source;
                        keepalive = self.config.ping_interval.and_then(keepalive_interval);
                        let _ = self.state_tx.send(WsConnectionState::Connected);
                    }
                    None => break,
                }
            }
        }

        info!("Connection loop ended");
    }

    async fn handle_text(&self, text: &str, ws_sink: &mut WsSink) {
        let frame = match serde_json::from_str::<Frame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                // Skip malformed frames without dropping the connection
                warn!("{} - {}", ProtocolError::from(e), text);
                return;
            }
        };

        debug!(
            frame_type = %frame.frame_type,
            correlation_id = ?frame.correlation_id,
            "Received frame"
        );

        if frame.frame_type == FrameType::Ping {
            write_frame(ws_sink, &Frame::pong()).await;
        }

        if self.incoming_tx.send(frame).is_err() {
            debug!("No frame subscribers, frame dropped");
        }
    }

    /// Attempt to reconnect with capped exponential backoff
    async fn reconnect(&self) -> Option<(WsSink, WsSource)> {
        let policy = &self.config.reconnect;
        let mut attempt: u32 = 1;

        while policy.allows(attempt) {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("Shutdown requested during reconnection");
                return None;
            }

            let _ = self
                .state_tx
                .send(WsConnectionState::Reconnecting { attempt });

            let delay = policy.delay_for(attempt);
            info!(
                "Reconnection attempt {}, waiting {}ms",
                attempt,
                delay.as_millis()
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown_notify.notified() => {
                    debug!("Shutdown requested during backoff");
                    return None;
                }
            }

            match connect_async(self.url.as_str()).await {
                Ok((ws_stream, _)) => {
                    info!("Reconnected successfully on attempt {}", attempt);
                    return Some(ws_stream.split());
                }
                Err(e) => {
                    warn!("Reconnection attempt {} failed: {}", attempt, e);
                }
            }

            attempt = attempt.saturating_add(1);
        }

        error!(
            "Failed to reconnect after {} attempts, giving up",
            attempt.saturating_sub(1)
        );
        None
    }
}

async fn write_frame(ws_sink: &mut WsSink, frame: &Frame) {
    match serde_json::to_string(frame) {
        Ok(json) => {
            debug!("Sending frame: {}", json);
            if let Err(e) = ws_sink.send(Message::Text(json)).await {
                // The read side notices a dead socket and reconnects
                error!("Failed to send frame: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to serialize frame: {}", e);
        }
    }
}

/// Keepalive timer, or `None` when the period is zero or too far out to
/// schedule.
fn keepalive_interval(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let Some(start) = Instant::now().checked_add(period) else {
        warn!("Keepalive interval {:?} is out of range, keepalive disabled", period);
        return None;
    };
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
