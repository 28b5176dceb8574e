//! Session-scoped connection lifecycle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::manager::ConnectionManager;
use crate::error::{ConfigError, ErrorContext, RealtimeResult, ResultExt};
use crate::traits::Connector;
use crate::websocket::WsClientConfig;

struct ActiveSession {
    token: String,
    manager: Arc<ConnectionManager>,
    pump: JoinHandle<()>,
}

/// Owns at most one connection, bound to the current session token.
///
/// ```ignore
/// let mut provider = ConnectionProvider::new(TungsteniteConnector, config);
/// let manager = provider.on_session(Some(&token)).await?;
/// // ...
/// provider.logout();
/// ```
pub struct ConnectionProvider<K: Connector> {
    connector: K,
    config: WsClientConfig,
    active: Option<ActiveSession>,
}

impl<K: Connector> ConnectionProvider<K> {
    pub fn new(connector: K, config: WsClientConfig) -> Self {
        Self {
            connector,
            config,
            active: None,
        }
    }

    /// Ensure a connection exists for `token`.
    ///
    /// Reuses the live connection for the same token, replaces it when the
    /// token changed, and tears everything down when there is no session.
    pub async fn on_session(
        &mut self,
        token: Option<&str>,
    ) -> RealtimeResult<Arc<ConnectionManager>> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            self.logout();
            return Err(ConfigError::MissingSessionToken.into());
        };

        if let Some(active) = &self.active {
            if active.token == token {
                return Ok(active.manager.clone());
            }
            info!("Session changed, replacing connection");
            self.logout();
        }

        let config = self.config.clone().with_auth(token);
        let connection = self
            .connector
            .connect(&config)
            .await
            .with_context(|| {
                ErrorContext::new("connect").with_component("connection_provider")
            })?;

        let manager = ConnectionManager::new(connection);
        let pump = manager.start();
        info!("Realtime connection ready");

        self.active = Some(ActiveSession {
            token: token.to_string(),
            manager: manager.clone(),
            pump,
        });
        Ok(manager)
    }

    pub fn manager(&self) -> Option<Arc<ConnectionManager>> {
        self.active.as_ref().map(|active| active.manager.clone())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Tear down the current connection, if any.
    pub fn logout(&mut self) {
        if let Some(active) = self.active.take() {
            info!("Closing realtime connection");
            active.manager.shutdown();
            active.pump.abort();
        }
    }
}

impl<K: Connector> Drop for ConnectionProvider<K> {
    fn drop(&mut self) {
        self.logout();
    }
}
