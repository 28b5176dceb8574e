//! Startup configuration.
//!
//! Settings come from `PLAYGROUND_*` environment variables and may be
//! overridden by command-line flags. Malformed values are errors, never
//! silent defaults.

use std::time::Duration;

use crate::chat::ChatConfig;
use crate::error::ConfigError;
use crate::websocket::{ReconnectPolicy, WsClientConfig};

pub const ENV_HOST: &str = "PLAYGROUND_WS_HOST";
pub const ENV_PATH: &str = "PLAYGROUND_WS_PATH";
pub const ENV_TLS: &str = "PLAYGROUND_WS_TLS";
pub const ENV_SESSION_TOKEN: &str = "PLAYGROUND_SESSION_TOKEN";
pub const ENV_ENDPOINT_ID: &str = "PLAYGROUND_ENDPOINT_ID";
pub const ENV_MAX_RETRIES: &str = "PLAYGROUND_MAX_RETRIES";
pub const ENV_MAX_BACKOFF_SECS: &str = "PLAYGROUND_MAX_BACKOFF_SECS";
pub const ENV_PING_SECS: &str = "PLAYGROUND_PING_SECS";
pub const ENV_RESPONSE_TIMEOUT_SECS: &str = "PLAYGROUND_RESPONSE_TIMEOUT_SECS";

/// Upper bound for any interval setting (one day).
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Configuration for a playground session.
///
/// # Example
///
/// ```ignore
/// use playground_realtime::startup::StartupConfig;
///
/// let config = StartupConfig::from_env()?
///     .with_host("realtime.example.com")
///     .with_tls(true);
/// let ws = config.ws_config();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// Realtime server `host[:port]`
    pub host: String,
    /// Socket path (default: /ws)
    pub path: String,
    pub use_tls: bool,
    /// Token of the authenticated session
    pub session_token: Option<String>,
    /// Endpoint the chat talks to on start
    pub endpoint_id: Option<String>,
    /// Reconnect attempts; `None` retries forever
    pub max_retries: Option<u32>,
    pub max_backoff: Duration,
    /// Keepalive interval; `None` disables keepalive
    pub ping_interval: Option<Duration>,
    /// Per-request response timeout; `None` waits forever
    pub response_timeout: Option<Duration>,
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:8080".to_string(),
            path: "/ws".to_string(),
            use_tls: false,
            session_token: None,
            endpoint_id: None,
            max_retries: None,
            max_backoff: Duration::from_secs(30),
            ping_interval: Some(Duration::from_secs(25)),
            response_timeout: None,
            verbose: false,
        }
    }
}

impl StartupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(ENV_HOST) {
            config.host = validate_host(&host)?;
        }
        if let Some(path) = get(ENV_PATH) {
            config.path = path;
        }
        if let Some(tls) = get(ENV_TLS) {
            config.use_tls = parse_bool(ENV_TLS, &tls)?;
        }
        config.session_token = get(ENV_SESSION_TOKEN);
        config.endpoint_id = get(ENV_ENDPOINT_ID);
        if let Some(retries) = get(ENV_MAX_RETRIES) {
            config.max_retries = Some(parse_number(ENV_MAX_RETRIES, &retries)?);
        }
        if let Some(secs) = get(ENV_MAX_BACKOFF_SECS) {
            config.max_backoff = Duration::from_secs(parse_secs(ENV_MAX_BACKOFF_SECS, &secs)?);
        }
        if let Some(secs) = get(ENV_PING_SECS) {
            let secs = parse_secs(ENV_PING_SECS, &secs)?;
            config.ping_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = get(ENV_RESPONSE_TIMEOUT_SECS) {
            let secs = parse_secs(ENV_RESPONSE_TIMEOUT_SECS, &secs)?;
            config.response_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_endpoint(mut self, endpoint_id: impl Into<String>) -> Self {
        self.endpoint_id = Some(endpoint_id.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Transport settings. The session token is attached by the provider.
    pub fn ws_config(&self) -> WsClientConfig {
        let reconnect = ReconnectPolicy {
            max_backoff: self.max_backoff,
            max_retries: self.max_retries,
            ..ReconnectPolicy::default()
        };
        WsClientConfig {
            path: self.path.clone(),
            ..WsClientConfig::default()
        }
        .with_host(self.host.clone())
        .with_tls(self.use_tls)
        .with_reconnect(reconnect)
        .with_ping_interval(self.ping_interval)
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig::default().with_response_timeout(self.response_timeout)
    }
}

/// Accepts `host` or `host:port`; rejects schemes, paths and whitespace.
pub fn validate_host(host: &str) -> Result<String, ConfigError> {
    let host = host.trim();
    let bad = host.is_empty()
        || host.contains("://")
        || host.contains('/')
        || host.chars().any(char::is_whitespace);
    if bad {
        return Err(ConfigError::InvalidHost(host.to_string()));
    }
    if let Some((_, port)) = host.rsplit_once(':') {
        if !host.ends_with(']') && port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidHost(host.to_string()));
        }
    }
    Ok(host.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "a boolean (true/false)")),
    }
}

/// Seconds in `0..=MAX_INTERVAL_SECS`.
fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    let secs: u64 = parse_number(key, value)?;
    if secs > MAX_INTERVAL_SECS {
        return Err(ConfigError::invalid(
            key,
            value,
            "a number of seconds no greater than 86400",
        ));
    }
    Ok(secs)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value, "a non-negative whole number"))
}
