//! Environment-driven configuration. These tests mutate the process
//! environment, so they run serially.

use std::time::Duration;

use playground_realtime::error::ConfigError;
use playground_realtime::startup::config::{
    ENV_ENDPOINT_ID, ENV_HOST, ENV_MAX_BACKOFF_SECS, ENV_PING_SECS, ENV_RESPONSE_TIMEOUT_SECS,
    ENV_SESSION_TOKEN, ENV_TLS,
};
use playground_realtime::startup::StartupConfig;
use serial_test::serial;

const ALL: &[&str] = &[
    ENV_HOST,
    ENV_TLS,
    ENV_SESSION_TOKEN,
    ENV_ENDPOINT_ID,
    ENV_MAX_BACKOFF_SECS,
    ENV_PING_SECS,
    ENV_RESPONSE_TIMEOUT_SECS,
];

fn clear_env() {
    for key in ALL {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = StartupConfig::from_env().unwrap();

    assert_eq!(config, StartupConfig::default());
    assert_eq!(config.ws_config().url(), "ws://127.0.0.1:8080/ws");
}

#[test]
#[serial]
fn test_from_env_reads_values() {
    clear_env();
    std::env::set_var(ENV_HOST, "realtime.example.com:8443");
    std::env::set_var(ENV_TLS, "true");
    std::env::set_var(ENV_SESSION_TOKEN, "tok-1");
    std::env::set_var(ENV_ENDPOINT_ID, "ep-1");
    std::env::set_var(ENV_MAX_BACKOFF_SECS, "10");
    std::env::set_var(ENV_RESPONSE_TIMEOUT_SECS, "45");

    let config = StartupConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.session_token.as_deref(), Some("tok-1"));
    assert_eq!(config.endpoint_id.as_deref(), Some("ep-1"));
    let ws = config.ws_config();
    assert_eq!(ws.url(), "wss://realtime.example.com:8443/ws");
    assert_eq!(ws.reconnect.max_backoff, Duration::from_secs(10));
    assert_eq!(
        config.chat_config().response_timeout,
        Some(Duration::from_secs(45))
    );
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clear_env();
    std::env::set_var(ENV_PING_SECS, "often");
    let err = StartupConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    std::env::set_var(ENV_HOST, "https://example.com");
    let err = StartupConfig::from_env().unwrap_err();
    clear_env();
    assert_eq!(err, ConfigError::InvalidHost("https://example.com".into()));
}
