//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`WebSocketConnection`] - a live socket: send, subscribe, state
//! - [`Connector`] - opens a [`WebSocketConnection`] for a session

pub mod websocket;

pub use websocket::{Connector, WebSocketConnection};
