use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::command::{handle_command, Caller};
use crate::platform::{ChatChannel, ChatEvent, ConnectionDirection, ConnectionEvent};
use crate::relay::Relay;

/// One line of the host's newline-delimited JSON event feed.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    PlayerConnected {
        name: String,
    },
    PlayerDisconnected {
        name: String,
    },
    PlayerChat {
        name: String,
        message: String,
        channel: ChatChannel,
    },
    Command {
        caller: Caller,
        #[serde(default)]
        args: Vec<String>,
    },
}

pub fn parse_event(line: &str) -> Result<HostEvent> {
    serde_json::from_str(line).context("Failed to parse host event")
}

/// Route one event to the relay. Returns reply lines for commands.
pub fn handle_event(relay: &mut Relay, event: HostEvent) -> Vec<String> {
    match event {
        HostEvent::PlayerConnected { name } => {
            relay.on_connection(&ConnectionEvent {
                player_name: name,
                direction: ConnectionDirection::Connected,
            });
            Vec::new()
        }
        HostEvent::PlayerDisconnected { name } => {
            relay.on_connection(&ConnectionEvent {
                player_name: name,
                direction: ConnectionDirection::Disconnected,
            });
            Vec::new()
        }
        HostEvent::PlayerChat {
            name,
            message,
            channel,
        } => {
            relay.on_player_chat(&ChatEvent {
                channel,
                player_name: name,
                text: message,
            });
            Vec::new()
        }
        HostEvent::Command { caller, args } => handle_command(relay, &caller, &args),
    }
}

/// Read events from `input` until EOF, writing command replies to `output`.
///
/// Malformed lines, including lines that are not valid UTF-8, are logged
/// and skipped.
pub async fn run<R, W>(relay: &mut Relay, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read host event")?;
        if read == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Skipping host event that is not valid UTF-8: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let event = match parse_event(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping host event: {:#}", e);
                continue;
            }
        };
        debug!("Host event: {:?}", event);

        for reply in handle_event(relay, event) {
            output
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .context("Failed to write command reply")?;
        }
        output.flush().await.context("Failed to flush command reply")?;
    }

    info!("Host event stream closed");
    Ok(())
}
