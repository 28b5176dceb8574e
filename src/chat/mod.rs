//! Correlation layer: request/response chat over the shared connection.
//!
//! A [`PlaygroundChat`] sends `CHAT_MESSAGE` frames tagged with a fresh
//! correlation id and accepts only the `CHAT_RESPONSE` / `CHAT_ERROR` that
//! carries the id of its single pending request. Everything else is
//! ignored, so several chats can share one connection.

mod message;
mod state;

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::{lock, ConnectionManager, Subscription};
use crate::error::{ChatError, ProtocolError};
use crate::websocket::{
    ChatErrorPayload, ChatMessagePayload, ChatResponsePayload, Frame, FrameType,
};

pub use message::{ChatMessage, Role};
pub use state::{ChatPhase, ChatSnapshot};

use state::{ChatState, PendingRequest};

/// Behaviour knobs for a chat instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatConfig {
    /// Give up on an unanswered request after this long. `None` waits
    /// forever.
    pub response_timeout: Option<Duration>,
}

impl ChatConfig {
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }
}

struct Shared {
    state: Mutex<ChatState>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn on_frame(&self, frame: &Frame) {
        {
            let mut state = lock(&self.state);
            let Some(pending) = state.take_pending(frame.correlation_id.as_deref()) else {
                debug!(
                    frame_type = %frame.frame_type,
                    correlation_id = ?frame.correlation_id,
                    "Ignoring uncorrelated frame"
                );
                return;
            };
            debug!(
                correlation_id = %pending.correlation_id,
                elapsed_ms = pending.sent_at.elapsed().as_millis() as u64,
                "Request answered"
            );
            pending.settle();

            if frame.frame_type == FrameType::ChatResponse {
                match frame.payload_as::<ChatResponsePayload>() {
                    Ok(response) => {
                        if response.session_id.is_some() {
                            state.session_id = response.session_id;
                        }
                        state
                            .messages
                            .push(ChatMessage::assistant(response.output, response.trace_id));
                    }
                    Err(e) => fail(&mut state, undecodable(frame, &e)),
                }
            } else {
                let err = match frame.payload_as::<ChatErrorPayload>() {
                    Ok(payload) => ChatError::Server(payload.error),
                    Err(e) => undecodable(frame, &e),
                };
                fail(&mut state, err);
            }
        }
        self.notify();
    }

    fn expire(&self, correlation_id: &str, after: Duration) {
        {
            let mut state = lock(&self.state);
            if state.take_pending(Some(correlation_id)).is_none() {
                return;
            }
            warn!(correlation_id, "No response after {:?}", after);
            fail(&mut state, ChatError::Timeout { after });
        }
        self.notify();
    }
}

fn fail(state: &mut ChatState, err: ChatError) {
    state.messages.push(ChatMessage::error(err.to_string()));
    state.error = Some(err);
}

fn undecodable(frame: &Frame, err: &serde_json::Error) -> ChatError {
    let err = ProtocolError::invalid_payload(&frame.frame_type, err);
    warn!("{}", err);
    ChatError::Server(err.to_string())
}

/// One playground conversation with a target endpoint.
pub struct PlaygroundChat {
    manager: Arc<ConnectionManager>,
    config: ChatConfig,
    shared: Arc<Shared>,
    _subscriptions: [Subscription; 2],
}

impl PlaygroundChat {
    pub fn new(
        manager: &Arc<ConnectionManager>,
        endpoint_id: Option<String>,
        config: ChatConfig,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            state: Mutex::new(ChatState {
                endpoint_id,
                ..Default::default()
            }),
            revision,
        });

        let subscriptions = [FrameType::ChatResponse, FrameType::ChatError].map(|frame_type| {
            let shared: Weak<Shared> = Arc::downgrade(&shared);
            manager.subscribe(frame_type, move |frame: &Frame| {
                if let Some(shared) = shared.upgrade() {
                    shared.on_frame(frame);
                }
            })
        });

        Self {
            manager: manager.clone(),
            config,
            shared,
            _subscriptions: subscriptions,
        }
    }

    /// Send `text` to the selected endpoint.
    ///
    /// Returns the correlation id of the request. A refusal (no endpoint,
    /// disconnected, request pending, empty text) or a failed send is also
    /// recorded in [`error`](Self::error).
    pub fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let result = self.transmit(text);
        if let Err(err) = &result {
            debug!(code = err.code(), "Chat message not sent: {}", err);
            lock(&self.shared.state).error = Some(err.clone());
        }
        self.shared.notify();
        result
    }

    fn transmit(&self, text: &str) -> Result<String, ChatError> {
        let (correlation_id, frame) = {
            let mut state = lock(&self.shared.state);
            let endpoint_id = state.endpoint_id.clone().ok_or(ChatError::NoEndpoint)?;
            if !self.manager.is_connected() {
                return Err(ChatError::Disconnected);
            }
            if state.pending.is_some() {
                return Err(ChatError::RequestPending);
            }
            let message = text.trim();
            if message.is_empty() {
                return Err(ChatError::EmptyMessage);
            }

            let correlation_id = Uuid::new_v4().to_string();
            let payload = ChatMessagePayload {
                endpoint_id,
                message: message.to_string(),
                session_id: state.session_id.clone(),
            };
            let frame = Frame::chat_message(correlation_id.clone(), &payload)
                .map_err(|e| ChatError::Encode(e.to_string()))?;

            state.error = None;
            state.messages.push(ChatMessage::user(message));
            state.pending = Some(PendingRequest::new(correlation_id.clone()));
            (correlation_id, frame)
        };

        if !self.manager.send(frame) {
            if let Some(pending) = lock(&self.shared.state).take_pending(Some(&correlation_id)) {
                pending.settle();
            }
            return Err(ChatError::SendFailed);
        }

        info!(%correlation_id, "Chat message sent");
        self.arm_timeout(&correlation_id);
        Ok(correlation_id)
    }

    fn arm_timeout(&self, correlation_id: &str) {
        let Some(after) = self.config.response_timeout else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, response timeout disabled");
            return;
        };

        let mut state = lock(&self.shared.state);
        let Some(pending) = state
            .pending
            .as_mut()
            .filter(|pending| pending.correlation_id == correlation_id)
        else {
            // Already answered.
            return;
        };

        let shared = Arc::downgrade(&self.shared);
        let id = correlation_id.to_string();
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(shared) = shared.upgrade() {
                shared.expire(&id, after);
            }
        });
        pending.timeout = Some(task.abort_handle());
    }

    /// Select the target endpoint. Switching endpoints starts a new
    /// session; the history is kept.
    pub fn set_endpoint(&self, endpoint_id: Option<String>) {
        {
            let mut state = lock(&self.shared.state);
            if state.endpoint_id == endpoint_id {
                return;
            }
            info!(endpoint_id = ?endpoint_id, "Endpoint selected");
            state.endpoint_id = endpoint_id;
            state.session_id = None;
        }
        self.shared.notify();
    }

    /// Empty the history and forget the session and last error.
    ///
    /// A request already in flight stays pending; its answer lands in the
    /// fresh history.
    pub fn clear_messages(&self) {
        {
            let mut state = lock(&self.shared.state);
            state.messages.clear();
            state.session_id = None;
            state.error = None;
        }
        self.shared.notify();
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.shared.state).messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.shared.state).pending.is_some()
    }

    pub fn phase(&self) -> ChatPhase {
        lock(&self.shared.state).phase()
    }

    pub fn session_id(&self) -> Option<String> {
        lock(&self.shared.state).session_id.clone()
    }

    pub fn error(&self) -> Option<ChatError> {
        lock(&self.shared.state).error.clone()
    }

    pub fn endpoint_id(&self) -> Option<String> {
        lock(&self.shared.state).endpoint_id.clone()
    }

    pub fn pending_correlation_id(&self) -> Option<String> {
        lock(&self.shared.state)
            .pending
            .as_ref()
            .map(|pending| pending.correlation_id.clone())
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        lock(&self.shared.state).snapshot()
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Revision counter bumped on every state change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Resolve once no request is pending.
    pub async fn wait_idle(&self) {
        let mut changes = self.changes();
        while self.is_loading() {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for PlaygroundChat {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.shared.state).pending.take() {
            pending.settle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockWebSocket;
    use serde_json::json;

    fn setup(endpoint: Option<&str>) -> (MockWebSocket, Arc<ConnectionManager>, PlaygroundChat) {
        let socket = MockWebSocket::new();
        let manager = ConnectionManager::new(Arc::new(socket.clone()));
        let chat = PlaygroundChat::new(&manager, endpoint.map(String::from), ChatConfig::default());
        (socket, manager, chat)
    }

    fn response(correlation_id: &str, output: &str) -> Frame {
        Frame::new(FrameType::ChatResponse, json!({ "output": output }))
            .with_correlation_id(correlation_id)
    }

    #[test]
    fn test_preconditions_in_order() {
        let socket = MockWebSocket::disconnected();
        let manager = ConnectionManager::new(Arc::new(socket.clone()));
        let chat = PlaygroundChat::new(&manager, None, ChatConfig::default());

        assert_eq!(chat.send_message("hi"), Err(ChatError::NoEndpoint));
        chat.set_endpoint(Some("ep-1".into()));
        assert_eq!(chat.send_message(""), Err(ChatError::Disconnected));
        assert_eq!(chat.error(), Some(ChatError::Disconnected));

        socket.simulate_reconnected();
        assert_eq!(chat.send_message("  "), Err(ChatError::EmptyMessage));
        chat.send_message("hi").unwrap();
        assert_eq!(chat.send_message("again"), Err(ChatError::RequestPending));

        assert_eq!(socket.sent_frames().len(), 1);
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn test_response_must_match_pending_id() {
        let (_socket, manager, chat) = setup(Some("ep-1"));
        let id = chat.send_message("Hello").unwrap();

        manager.dispatch(&response("other", "stray"));
        assert!(chat.is_loading());
        assert_eq!(chat.messages().len(), 1);

        manager.dispatch(&response(&id, "Hi!"));
        assert!(!chat.is_loading());
        assert_eq!(chat.messages()[1].content, "Hi!");
    }

    #[test]
    fn test_undecodable_response_is_an_error() {
        let (_socket, manager, chat) = setup(Some("ep-1"));
        let id = chat.send_message("Hello").unwrap();

        manager.dispatch(
            &Frame::new(FrameType::ChatResponse, json!({ "nope": 1 })).with_correlation_id(&id),
        );

        assert!(!chat.is_loading());
        assert!(matches!(chat.error(), Some(ChatError::Server(_))));
        assert!(chat.messages()[1].is_error);
    }

    #[test]
    fn test_changes_bumps_revision() {
        let (_socket, _manager, chat) = setup(Some("ep-1"));
        let changes = chat.changes();
        let before = *changes.borrow();

        chat.clear_messages();

        assert!(*changes.borrow() > before);
    }

    #[test]
    fn test_drop_releases_subscriptions() {
        let (_socket, manager, chat) = setup(Some("ep-1"));
        let key = crate::connection::EventKey::Type(FrameType::ChatResponse);
        assert_eq!(manager.subscriber_count(&key), 1);
        drop(chat);
        assert_eq!(manager.subscriber_count(&key), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_timeout() {
        let socket = MockWebSocket::new();
        let manager = ConnectionManager::new(Arc::new(socket.clone()));
        let config = ChatConfig::default().with_response_timeout(Some(Duration::from_secs(5)));
        let chat = PlaygroundChat::new(&manager, Some("ep-1".into()), config);

        let id = chat.send_message("Hello").unwrap();
        chat.wait_idle().await;

        assert_eq!(chat.error(), Some(ChatError::Timeout {
                after: Duration::from_secs(5)
            }));
        manager.dispatch(&response(&id, "late"));
        assert_eq!(chat.messages().len(), 2);
        assert!(chat.messages()[1].is_error);
    }
}
