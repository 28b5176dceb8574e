//! Error handling for the realtime layer.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Layer Errors**: transport ([`WsError`](crate::websocket::WsError)),
//!   protocol, chat and configuration errors
//! - **Unified Error Type**: [`RealtimeError`] consolidates all of them
//! - **Error Context**: debugging information attached to errors
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Socket refused, dropped, timed out | Yes |
//! | Auth | Missing session | No |
//! | Server | `CHAT_ERROR` from the endpoint | Yes |
//! | Client | Protocol mismatch | No |
//! | User | Caller action required | No |
//! | System | Terminal I/O | No |
//! | Configuration | Bad settings | No |

mod category;
mod chat;
mod config;
mod context;
mod protocol;
mod realtime_error;
mod result;

pub use category::ErrorCategory;
pub use chat::ChatError;
pub use config::ConfigError;
pub use context::ErrorContext;
pub use protocol::ProtocolError;
pub use realtime_error::RealtimeError;
pub use result::{RealtimeResult, ResultExt};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::websocket::WsError;

    #[test]
    fn test_error_unification() {
        let transport: RealtimeError = WsError::ConnectionFailed("refused".into()).into();
        let chat: RealtimeError = ChatError::Server("model overloaded".into()).into();
        let config: RealtimeError = ConfigError::MissingSessionToken.into();
        let io: RealtimeError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        let json: RealtimeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();

        assert_eq!(transport.category(), ErrorCategory::Network);
        assert_eq!(chat.category(), ErrorCategory::Server);
        assert_eq!(config.category(), ErrorCategory::Auth);
        assert_eq!(io.category(), ErrorCategory::System);
        assert_eq!(json.category(), ErrorCategory::Client);

        assert!(transport.is_retryable());
        assert!(chat.is_retryable());
        assert!(!config.is_retryable());

        for err in [&transport, &chat, &config, &io, &json] {
            assert!(!err.error_code().is_empty());
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_context_propagation() {
        let err: RealtimeError = ChatError::Timeout {
            after: std::time::Duration::from_secs(30),
        }
        .into();
        let with_ctx = err.with_context(
            ErrorContext::new("send_message")
                .with_endpoint_id("ep-1")
                .with_correlation_id("c1"),
        );

        assert_eq!(with_ctx.error_code(), "TIMEOUT");
        assert_eq!(with_ctx.category(), ErrorCategory::Network);
        assert!(matches!(with_ctx.inner(), RealtimeError::Chat(_)));
        assert!(with_ctx.to_string().contains("[send_message]"));
        assert!(with_ctx.user_message().contains("Context:"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: RealtimeError = WsError::Disconnected.into();
        assert!(err.source().is_some());
    }
}
