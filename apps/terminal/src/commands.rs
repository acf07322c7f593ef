//! Keyboard commands typed at the prompt, and their dispatch to the socket.

use client_core::GameHandle;
use shared::domain::Side;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pull(Side),
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "commands: l/left, r/right, h/help, q/quit";

pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let command = match trimmed.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        other => match other.parse::<Side>() {
            Ok(side) => Command::Pull(side),
            Err(_) => Command::Unknown(trimmed.to_string()),
        },
    };
    Some(command)
}

/// Sends a pull without waiting for any reply. Send failures are logged and
/// otherwise ignored; the next server update shows whether it landed.
pub async fn dispatch_pull(handle: &dyn GameHandle, side: Side) {
    if let Err(err) = handle.send_pull(side).await {
        warn!(%err, direction = side.as_str(), "pull not sent");
    }
}
