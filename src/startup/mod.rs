//! Startup: configuration and logging for the playground binary.
//!
//! - [`config`] - environment-driven [`StartupConfig`]
//! - [`logging`] - `tracing` subscriber installation

pub mod config;
pub mod logging;

pub use config::StartupConfig;
pub use logging::init_logging;
