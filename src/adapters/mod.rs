//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`TungsteniteWsConnection`] - WebSocket using tokio-tungstenite
//! - [`TungsteniteConnector`] - opens tungstenite connections per session
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockWebSocket`] - Frame injection for testing
//! - [`mock::MockConnector`] - Connector over a shared mock socket

pub mod mock;
pub mod tungstenite_ws;

pub use mock::{MockConnector, MockWebSocket};
pub use tungstenite_ws::{TungsteniteConnector, TungsteniteWsConnection};
