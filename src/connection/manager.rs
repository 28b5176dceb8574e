//! Connection manager: one socket multiplexed across many subscribers.
//!
//! Handlers are keyed by [`EventKey`]; every key holds a list so several
//! components can listen for the same frame type. Dispatch snapshots the
//! matching handlers and releases the registry lock before calling them, so
//! a handler may subscribe or unsubscribe (itself included) while running.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::lock;
use crate::error::ProtocolError;
use crate::traits::WebSocketConnection;
use crate::websocket::{ConnectedPayload, Frame, FrameType, WsConnectionState};

/// Callback invoked for each dispatched frame.
pub type FrameHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// What a handler listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Every frame, before any typed handler
    Any,
    /// Frames of exactly this type
    Type(FrameType),
}

impl From<FrameType> for EventKey {
    fn from(frame_type: FrameType) -> Self {
        EventKey::Type(frame_type)
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKey, Vec<(u64, FrameHandler)>>,
    channels: HashMap<String, usize>,
}

impl Registry {
    fn insert(&mut self, key: EventKey, handler: FrameHandler) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.handlers.entry(key).or_default().push((id, handler));
        id
    }

    fn remove(&mut self, key: &EventKey, id: u64) -> bool {
        let Some(list) = self.handlers.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(key);
        }
        removed
    }

    fn contains(&self, key: &EventKey, id: u64) -> bool {
        self.handlers
            .get(key)
            .is_some_and(|list| list.iter().any(|(handler_id, _)| *handler_id == id))
    }

    fn matching(&self, frame_type: &FrameType) -> Vec<(EventKey, u64, FrameHandler)> {
        let typed = EventKey::Type(frame_type.clone());
        [EventKey::Any, typed]
            .into_iter()
            .flat_map(|key| {
                self.handlers
                    .get(&key)
                    .map(|list| {
                        list.iter()
                            .map(|(id, handler)| (key.clone(), *id, handler.clone()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Handle for a registered handler.
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) removes exactly
/// this handler; other handlers for the same key stay registered.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    key: EventKey,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove the handler. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.key, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Owns the single socket of a session and fans inbound frames out to
/// subscribers.
pub struct ConnectionManager {
    connection: Arc<dyn WebSocketConnection>,
    state_rx: watch::Receiver<WsConnectionState>,
    registry: Arc<Mutex<Registry>>,
    connection_id: Mutex<Option<String>>,
}

impl ConnectionManager {
    pub fn new(connection: Arc<dyn WebSocketConnection>) -> Arc<Self> {
        let state_rx = connection.state();
        Arc::new(Self {
            connection,
            state_rx,
            registry: Arc::new(Mutex::new(Registry::default())),
            connection_id: Mutex::new(None),
        })
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state_rx.borrow(), WsConnectionState::Connected)
    }

    pub fn connection_state(&self) -> WsConnectionState {
        self.state_rx.borrow().clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<WsConnectionState> {
        self.state_rx.clone()
    }

    /// Server-assigned id from the latest `CONNECTED` frame.
    pub fn connection_id(&self) -> Option<String> {
        lock(&self.connection_id).clone()
    }

    /// Queue a frame. Returns `false` when the socket is not open or the
    /// frame could not be queued; never panics.
    pub fn send(&self, frame: Frame) -> bool {
        let frame_type = frame.frame_type.clone();
        match self.connection.send(frame) {
            Ok(()) => {
                debug!(%frame_type, "Frame queued");
                true
            }
            Err(e) => {
                warn!(%frame_type, "Frame not sent: {}", e);
                false
            }
        }
    }

    /// Register `handler` for `key`.
    pub fn subscribe<F>(&self, key: impl Into<EventKey>, handler: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.subscribe_handler(key.into(), Arc::new(handler))
    }

    pub fn subscribe_handler(&self, key: EventKey, handler: FrameHandler) -> Subscription {
        let id = lock(&self.registry).insert(key.clone(), handler);
        debug!(?key, id, "Handler subscribed");
        Subscription {
            registry: Arc::downgrade(&self.registry),
            key,
            id,
            active: true,
        }
    }

    /// Number of handlers registered for `key`.
    pub fn subscriber_count(&self, key: &EventKey) -> usize {
        lock(&self.registry)
            .handlers
            .get(key)
            .map_or(0, |list| list.len())
    }

    /// Join a channel. Only the first reference sends `SUBSCRIBE`.
    ///
    /// A `SUBSCRIBE` that cannot be sent now is replayed on reconnect.
    pub fn subscribe_to_channel(&self, channel: &str) {
        let first = {
            let mut registry = lock(&self.registry);
            let count = registry.channels.entry(channel.to_string()).or_insert(0);
            *count += 1;
            *count == 1
        };

        if first && !self.send(Frame::subscribe(channel)) {
            debug!(channel, "SUBSCRIBE deferred until the connection is back");
        }
    }

    /// Leave a channel. Only the last reference sends `UNSUBSCRIBE`.
    pub fn unsubscribe_from_channel(&self, channel: &str) {
        let last = {
            let mut registry = lock(&self.registry);
            let remaining = match registry.channels.get_mut(channel) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => {
                    debug!(channel, "Unsubscribe for a channel with no references");
                    return;
                }
            };
            if remaining == 0 {
                registry.channels.remove(channel);
            }
            remaining == 0
        };

        if last {
            self.send(Frame::unsubscribe(channel));
        }
    }

    /// Current reference count for `channel`.
    pub fn channel_refcount(&self, channel: &str) -> usize {
        lock(&self.registry)
            .channels
            .get(channel)
            .copied()
            .unwrap_or(0)
    }

    /// Channels with at least one reference, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = lock(&self.registry).channels.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Deliver one inbound frame: `Any` handlers first, then handlers for
    /// the frame's exact type.
    ///
    /// A handler removed while this dispatch is running is skipped. A
    /// panicking handler is logged and does not stop the others.
    pub fn dispatch(&self, frame: &Frame) {
        if frame.frame_type == FrameType::Connected {
            self.record_connection_id(frame);
        }

        let matching = lock(&self.registry).matching(&frame.frame_type);
        for (key, id, handler) in matching {
            if !lock(&self.registry).contains(&key, id) {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| handler(frame))).is_err() {
                error!(frame_type = %frame.frame_type, ?key, "Frame handler panicked");
            }
        }
    }

    fn record_connection_id(&self, frame: &Frame) {
        match frame.payload_as::<ConnectedPayload>() {
            Ok(payload) => {
                info!(connection_id = %payload.connection_id, "Connection established");
                *lock(&self.connection_id) = Some(payload.connection_id);
            }
            Err(e) => {
                warn!("{}", ProtocolError::invalid_payload(&frame.frame_type, &e));
            }
        }
    }

    /// React to a transport state change.
    pub fn handle_state_change(&self, state: &WsConnectionState) {
        match state {
            WsConnectionState::Connected => self.resubscribe_channels(),
            WsConnectionState::Reconnecting { attempt } => {
                debug!(attempt, "Connection reconnecting");
                lock(&self.connection_id).take();
            }
            WsConnectionState::Disconnected => {
                lock(&self.connection_id).take();
            }
        }
    }

    fn resubscribe_channels(&self) {
        let channels = self.active_channels();
        if channels.is_empty() {
            return;
        }
        info!(count = channels.len(), "Re-subscribing channels after reconnect");
        for channel in channels {
            self.send(Frame::subscribe(channel));
        }
    }

    /// Spawn the task that pumps inbound frames and state changes into
    /// [`dispatch`](Self::dispatch) and
    /// [`handle_state_change`](Self::handle_state_change).
    ///
    /// The task holds only a weak reference and stops once the manager is
    /// dropped or the frame stream closes.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut frames = self.connection.subscribe();
        let mut state_rx = self.connection.state();
        let _ = state_rx.borrow_and_update();
        let manager = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = frames.recv() => match frame {
                        Ok(frame) => {
                            let Some(manager) = manager.upgrade() else { break };
                            manager.dispatch(&frame);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Frame dispatch lagged, skipped {} frames", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("Frame stream closed");
                            break;
                        }
                    },
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            debug!("Connection state channel closed");
                            break;
                        }
                        let state = state_rx.borrow_and_update().clone();
                        let Some(manager) = manager.upgrade() else { break };
                        manager.handle_state_change(&state);
                    }
                }
            }
            debug!("Dispatch task ended");
        })
    }

    /// Close the underlying socket.
    pub fn shutdown(&self) {
        self.connection.shutdown();
    }
}
