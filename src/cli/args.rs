//! Command-line argument parsing for the playground CLI.
//!
//! Flags override the `PLAYGROUND_*` environment settings.

use crate::error::ConfigError;
use crate::startup::config::{validate_host, StartupConfig};

/// Flags given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub host: Option<String>,
    pub endpoint: Option<String>,
    pub tls: bool,
    pub verbose: bool,
}

impl CliArgs {
    /// Layer the flags over `config`.
    pub fn apply(&self, mut config: StartupConfig) -> Result<StartupConfig, ConfigError> {
        if let Some(host) = &self.host {
            config.host = validate_host(host)?;
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint_id = Some(endpoint.clone());
        }
        if self.tls {
            config.use_tls = true;
        }
        let verbose = config.verbose || self.verbose;
        Ok(config.with_verbose(verbose))
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Open the chat playground (default)
    Run(CliArgs),
}

pub const USAGE: &str = "\
Usage: playground [OPTIONS]

Options:
  --host <HOST>      Realtime server host[:port] (env PLAYGROUND_WS_HOST)
  --endpoint <ID>    Endpoint to chat with (env PLAYGROUND_ENDPOINT_ID)
  --tls              Connect with wss://
  -v, --verbose      Debug logging (env PLAYGROUND_LOG overrides)
  -V, --version      Print version
  -h, --help         Print this help

Commands inside the playground:
  /endpoint [ID]     Show or switch the target endpoint
  /clear             Clear the conversation
  /quit              Exit";

/// Parse command-line arguments (program name first).
///
/// # Examples
///
/// ```
/// use playground_realtime::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["playground".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap(), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ConfigError>
where
    I: Iterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.find('=') {
            Some(at) if arg.starts_with("--") => {
                (arg[..at].to_string(), Some(arg[at + 1..].to_string()))
            }
            _ => (arg, None),
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--tls" => parsed.tls = true,
            "--verbose" | "-v" => parsed.verbose = true,
            "--host" => parsed.host = Some(flag_value(&flag, inline, &mut args)?),
            "--endpoint" => parsed.endpoint = Some(flag_value(&flag, inline, &mut args)?),
            _ => return Err(ConfigError::UnknownFlag(flag)),
        }
    }

    Ok(CliCommand::Run(parsed))
}

fn flag_value<I>(flag: &str, inline: Option<String>, rest: &mut I) -> Result<String, ConfigError>
where
    I: Iterator<Item = String>,
{
    inline
        .or_else(|| rest.next())
        .filter(|value| !value.is_empty() && !value.starts_with("--"))
        .ok_or_else(|| ConfigError::MissingFlagValue(flag.to_string()))
}
