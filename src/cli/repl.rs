//! Line-oriented chat loop.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::chat::{ChatMessage, PlaygroundChat, Role};
use crate::error::RealtimeResult;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Send the text as a chat message
    Send(String),
    /// Switch endpoint, or show the current one when `None`
    Endpoint(Option<String>),
    Clear,
    Quit,
    Help,
    /// Blank line
    Nothing,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Nothing;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Send(line.to_string());
        };

        let mut parts = command.splitn(2, char::is_whitespace);
        match parts.next().unwrap_or_default() {
            "endpoint" => ReplCommand::Endpoint(
                parts
                    .next()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from),
            ),
            "clear" => ReplCommand::Clear,
            "quit" | "exit" => ReplCommand::Quit,
            "help" => ReplCommand::Help,
            _ => ReplCommand::Send(line.to_string()),
        }
    }
}

/// Render one history entry.
pub fn format_message(message: &ChatMessage) -> String {
    let label = match (message.role, message.is_error) {
        (Role::Assistant, true) => "error",
        (role, _) => role.label(),
    };
    match &message.trace_id {
        Some(trace_id) => format!("{}> {}  [trace {}]", label, message.content, trace_id),
        None => format!("{}> {}", label, message.content),
    }
}

/// Read commands from `input` until EOF or `/quit`.
///
/// After each accepted message the loop waits for the answer (or the
/// timeout) and prints the assistant entries it produced.
pub async fn run<R, W>(chat: &PlaygroundChat, input: R, out: &mut W) -> RealtimeResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match ReplCommand::parse(&line) {
            ReplCommand::Nothing => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(out, "{}", super::args::USAGE)?,
            ReplCommand::Clear => {
                chat.clear_messages();
                writeln!(out, "(conversation cleared)")?;
            }
            ReplCommand::Endpoint(None) => match chat.endpoint_id() {
                Some(id) => writeln!(out, "(endpoint: {})", id)?,
                None => writeln!(out, "(no endpoint selected; /endpoint <id>)")?,
            },
            ReplCommand::Endpoint(Some(id)) => {
                chat.set_endpoint(Some(id.clone()));
                writeln!(out, "(endpoint: {}, new session)", id)?;
            }
            ReplCommand::Send(text) => {
                let before = chat.messages().len();
                if let Err(err) = chat.send_message(&text) {
                    writeln!(out, "error> {}", err)?;
                    continue;
                }
                chat.wait_idle().await;
                for message in chat.messages().iter().skip(before) {
                    if message.role == Role::Assistant {
                        writeln!(out, "{}", format_message(message))?;
                    }
                }
                if let Some(session_id) = chat.session_id() {
                    debug!(%session_id, "Session active");
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}
