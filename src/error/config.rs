//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable or flag held a value of the wrong shape
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid host '{0}': expected host[:port] without scheme or path")]
    InvalidHost(String),

    /// A connection was requested without an authenticated session
    #[error("No session token available; sign in first")]
    MissingSessionToken,

    #[error("Missing value for flag {0}")]
    MissingFlagValue(String),

    #[error("Unknown flag {0}")]
    UnknownFlag(String),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }
}
