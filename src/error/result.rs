//! Result type alias for realtime operations.

use super::context::ErrorContext;
use super::realtime_error::RealtimeError;

/// Type alias for Results using RealtimeError.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Extension trait for Result types to add context to errors.
pub trait ResultExt<T> {
    /// Add context to an error if the result is Err.
    ///
    /// ```ignore
    /// connector
    ///     .connect(&config)
    ///     .await
    ///     .context(ErrorContext::new("connect").with_component("connection_provider"))?;
    /// ```
    fn context(self, ctx: ErrorContext) -> RealtimeResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> RealtimeResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<RealtimeError>,
{
    fn context(self, ctx: ErrorContext) -> RealtimeResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> RealtimeResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::websocket::WsError;

    #[test]
    fn test_context_extension() {
        let result: RealtimeResult<i32> = Err(WsError::Disconnected.into());

        let err = result.context(ErrorContext::new("test_operation")).unwrap_err();
        assert_eq!(err.context().unwrap().operation, "test_operation");
    }

    #[test]
    fn test_context_extension_preserves_ok() {
        let result: RealtimeResult<i32> = Ok(42);
        assert_eq!(result.context(ErrorContext::new("noop")).unwrap(), 42);
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let result: Result<i32, WsError> = Ok(42);
        let mut called = false;

        let with_ctx = result.with_context(|| {
            called = true;
            ErrorContext::new("test")
        });

        assert!(with_ctx.is_ok());
        assert!(!called);
    }

    #[test]
    fn test_context_on_foreign_error() {
        let result: Result<(), ChatError> = Err(ChatError::NoEndpoint);
        let err = result
            .with_context(|| ErrorContext::new("send_message").with_endpoint_id("ep-1"))
            .unwrap_err();

        assert_eq!(err.error_code(), "NO_ENDPOINT");
        assert_eq!(err.context().unwrap().endpoint_id.as_deref(), Some("ep-1"));
    }
}
