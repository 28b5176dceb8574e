//! Errors raised by a playground chat instance.

use std::time::Duration;

use thiserror::Error;

use super::category::ErrorCategory;

/// Why a chat request was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("No endpoint selected")]
    NoEndpoint,

    #[error("Not connected to the realtime server")]
    Disconnected,

    #[error("A request is already in progress")]
    RequestPending,

    #[error("Message is empty")]
    EmptyMessage,

    /// The connection refused the frame
    #[error("Failed to send message")]
    SendFailed,

    /// Failure reported by the server, shown verbatim
    #[error("{0}")]
    Server(String),

    #[error("No response received within {after:?}")]
    Timeout { after: Duration },

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl ChatError {
    /// Stable code for logging and programmatic matching.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::NoEndpoint => "NO_ENDPOINT",
            ChatError::Disconnected => "DISCONNECTED",
            ChatError::RequestPending => "REQUEST_PENDING",
            ChatError::EmptyMessage => "EMPTY_MESSAGE",
            ChatError::SendFailed => "SEND_FAILED",
            ChatError::Server(_) => "SERVER_ERROR",
            ChatError::Timeout { .. } => "TIMEOUT",
            ChatError::Encode(_) => "ENCODE_FAILED",
        }
    }

    /// Precondition failures never reach the wire.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ChatError::NoEndpoint
                | ChatError::Disconnected
                | ChatError::RequestPending
                | ChatError::EmptyMessage
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::NoEndpoint | ChatError::RequestPending | ChatError::EmptyMessage => {
                ErrorCategory::User
            }
            ChatError::Disconnected | ChatError::SendFailed | ChatError::Timeout { .. } => {
                ErrorCategory::Network
            }
            ChatError::Server(_) => ErrorCategory::Server,
            ChatError::Encode(_) => ErrorCategory::Client,
        }
    }
}
