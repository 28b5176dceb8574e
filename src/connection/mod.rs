//! Connection management for the realtime layer.
//!
//! - [`ConnectionManager`] owns one socket per session and multiplexes it
//!   across handler subscriptions and reference-counted channels.
//! - [`ConnectionProvider`] creates the manager when a session exists and
//!   tears it down on logout.

pub mod manager;
pub mod provider;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use manager::{ConnectionManager, EventKey, FrameHandler, Subscription};
pub use provider::ConnectionProvider;

/// Lock a mutex, recovering the data if a handler panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
