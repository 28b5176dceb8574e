//! Mock implementations for testing.
//!
//! This module provides mock implementations of the socket traits,
//! enabling unit testing without network dependencies.
//!
//! # Available Mocks
//!
//! - [`MockWebSocket`] - WebSocket with frame injection
//! - [`MockConnector`] - Connector handing out a shared [`MockWebSocket`]

pub mod websocket;

pub use websocket::{MockConnector, MockWebSocket};
