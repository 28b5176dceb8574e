//! Playground realtime - the WebSocket layer of an endpoint chat playground
//!
//! One connection per session ([`connection`]), component-scoped routing
//! ([`router`]) and correlated request/response chat ([`chat`]) on top of a
//! tokio-tungstenite transport ([`websocket`]).

pub mod adapters;
pub mod chat;
pub mod cli;
pub mod connection;
pub mod error;
pub mod router;
pub mod startup;
pub mod traits;
pub mod websocket;
