//! Unified error type for the realtime layer.

use std::fmt;

use super::category::ErrorCategory;
use super::chat::ChatError;
use super::config::ConfigError;
use super::context::ErrorContext;
use super::protocol::ProtocolError;
use crate::websocket::WsError;

/// Unified error type for the realtime layer.
///
/// Wraps each layer's error so callers (the CLI, embedders) can categorise
/// and report failures uniformly.
#[derive(Debug)]
pub enum RealtimeError {
    /// Socket transport errors.
    Transport(WsError),

    /// Malformed frames or payloads.
    Protocol(ProtocolError),

    /// Chat-level refusals and failures.
    Chat(ChatError),

    /// Invalid configuration.
    Config(ConfigError),

    /// Terminal I/O errors.
    Io(std::io::Error),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<RealtimeError>,
        context: ErrorContext,
    },
}

impl RealtimeError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RealtimeError::Transport(WsError::ParseError(_)) => ErrorCategory::Client,
            RealtimeError::Transport(_) => ErrorCategory::Network,
            RealtimeError::Protocol(_) => ErrorCategory::Client,
            RealtimeError::Chat(err) => err.category(),
            RealtimeError::Config(ConfigError::MissingSessionToken) => ErrorCategory::Auth,
            RealtimeError::Config(_) => ErrorCategory::Configuration,
            RealtimeError::Io(_) => ErrorCategory::System,
            RealtimeError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            RealtimeError::Transport(err) => match err {
                WsError::ConnectionFailed(_) => "E_WS_CONN",
                WsError::Disconnected => "E_WS_DISCONNECTED",
                WsError::SendFailed(_) => "E_WS_SEND",
                WsError::ParseError(_) => "E_WS_PARSE",
                WsError::Timeout(_) => "E_WS_TIMEOUT",
                WsError::Other(_) => "E_WS_OTHER",
            },
            RealtimeError::Protocol(_) => "E_PROTOCOL",
            RealtimeError::Chat(err) => err.code(),
            RealtimeError::Config(_) => "E_CONFIG",
            RealtimeError::Io(_) => "E_IO",
            RealtimeError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            RealtimeError::WithContext { error, context } => {
                format!("{}\n\nContext: {}", error.user_message(), context)
            }
            other => format!("{} ({})", other, other.category().recovery_hint()),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        RealtimeError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RealtimeError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &RealtimeError {
        match self {
            RealtimeError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }
}

impl fmt::Display for RealtimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealtimeError::Transport(err) => write!(f, "{}", err),
            RealtimeError::Protocol(err) => write!(f, "{}", err),
            RealtimeError::Chat(err) => write!(f, "{}", err),
            RealtimeError::Config(err) => write!(f, "{}", err),
            RealtimeError::Io(err) => write!(f, "I/O error: {}", err),
            RealtimeError::WithContext { error, context } => {
                write!(f, "{} ({})", error, context)
            }
        }
    }
}

impl std::error::Error for RealtimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RealtimeError::Transport(err) => Some(err),
            RealtimeError::Protocol(err) => Some(err),
            RealtimeError::Chat(err) => Some(err),
            RealtimeError::Config(err) => Some(err),
            RealtimeError::Io(err) => Some(err),
            RealtimeError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<WsError> for RealtimeError {
    fn from(err: WsError) -> Self {
        RealtimeError::Transport(err)
    }
}

impl From<ProtocolError> for RealtimeError {
    fn from(err: ProtocolError) -> Self {
        RealtimeError::Protocol(err)
    }
}

impl From<ChatError> for RealtimeError {
    fn from(err: ChatError) -> Self {
        RealtimeError::Chat(err)
    }
}

impl From<ConfigError> for RealtimeError {
    fn from(err: ConfigError) -> Self {
        RealtimeError::Config(err)
    }
}

impl From<std::io::Error> for RealtimeError {
    fn from(err: std::io::Error) -> Self {
        RealtimeError::Io(err)
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::Protocol(err.into())
    }
}
