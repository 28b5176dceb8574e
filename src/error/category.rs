//! Error categories used to decide how an error is handled.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Socket-level problems (refused, dropped, timed out).
    /// Generally transient and retryable.
    Network,

    /// Missing or rejected session.
    Auth,

    /// The server answered with a failure (`CHAT_ERROR`).
    Server,

    /// Malformed frames or payloads; indicates a protocol mismatch.
    Client,

    /// The caller must act first (pick an endpoint, wait, type something).
    User,

    /// OS-level errors (stdin/stdout).
    System,

    /// Invalid settings or environment values.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the realtime server is reachable and try again",
            ErrorCategory::Auth => "Sign in again to obtain a fresh session token",
            ErrorCategory::Server => "The endpoint reported a failure. Try again or pick another endpoint",
            ErrorCategory::Client => "Client and server disagree on the protocol. Update the client",
            ErrorCategory::User => "Check your input and try again",
            ErrorCategory::System => "Check terminal input and output streams",
            ErrorCategory::Configuration => "Check the PLAYGROUND_* environment variables and flags",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
