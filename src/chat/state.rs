//! Mutable state of one chat instance.

use std::time::Instant;

use tokio::task::AbortHandle;

use super::message::ChatMessage;
use crate::error::ChatError;

/// The single request awaiting an answer.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub correlation_id: String,
    pub sent_at: Instant,
    pub timeout: Option<AbortHandle>,
}

impl PendingRequest {
    pub fn new(correlation_id: String) -> Self {
        Self {
            correlation_id,
            sent_at: Instant::now(),
            timeout: None,
        }
    }

    /// Stop the timeout task, if any.
    pub fn settle(self) {
        if let Some(timeout) = self.timeout {
            timeout.abort();
        }
    }
}

/// Whether a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Sending,
}

#[derive(Debug, Default)]
pub(crate) struct ChatState {
    pub endpoint_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
    pub error: Option<ChatError>,
    pub pending: Option<PendingRequest>,
}

impl ChatState {
    pub fn phase(&self) -> ChatPhase {
        if self.pending.is_some() {
            ChatPhase::Sending
        } else {
            ChatPhase::Idle
        }
    }

    /// Take the pending request if `correlation_id` answers it.
    pub fn take_pending(&mut self, correlation_id: Option<&str>) -> Option<PendingRequest> {
        let answers = matches!(
            (&self.pending, correlation_id),
            (Some(pending), Some(id)) if pending.correlation_id == id
        );
        if answers {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            endpoint_id: self.endpoint_id.clone(),
            messages: self.messages.clone(),
            is_loading: self.pending.is_some(),
            session_id: self.session_id.clone(),
            error: self.error.clone(),
        }
    }
}

/// Point-in-time copy of everything a view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    pub endpoint_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub session_id: Option<String>,
    pub error: Option<ChatError>,
}
