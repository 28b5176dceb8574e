//! CLI for the chat playground.
//!
//! - Argument parsing ([`args`])
//! - The interactive loop ([`repl`])
//!
//! ```ignore
//! use playground_realtime::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("playground {}", VERSION),
//!     CliCommand::Help => println!("{}", USAGE),
//!     CliCommand::Run(args) => { /* connect and run the repl */ }
//! }
//! ```

pub mod args;
pub mod repl;

pub use args::{parse_args, CliArgs, CliCommand, USAGE};
pub use repl::{format_message, ReplCommand};

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
