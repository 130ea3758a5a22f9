use serde::Deserialize;
use tracing::{error, warn};

use crate::relay::Relay;

pub const COMMAND_NAME: &str = "chattotelegram";
pub const ADMIN_PERMISSION: &str = "chattotelegram.admin";

const HELP_COLUMN_WIDTH: usize = 30;

/// The player or console issuing a command
#[derive(Debug, Clone, Deserialize)]
pub struct Caller {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Caller {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Handle `chattotelegram [loadconfig]` and return the reply lines.
pub fn handle_command(relay: &mut Relay, caller: &Caller, args: &[String]) -> Vec<String> {
    if !caller.has_permission(ADMIN_PERMISSION) {
        let denial = relay.config().messages.no_permission.clone();
        warn!(
            "UserID: {} | UserName: {} | {}",
            caller.id, caller.name, denial
        );
        return vec![denial];
    }

    match args.first().map(String::as_str) {
        None => help_lines(relay),
        Some("loadconfig") => match relay.reload() {
            Ok(()) => vec![relay.config().messages.file_loaded.clone()],
            Err(e) => {
                error!("Failed to reload config: {:#}", e);
                vec![format!("Failed to reload config: {}", e)]
            }
        },
        Some(_) => Vec::new(),
    }
}

fn help_lines(relay: &Relay) -> Vec<String> {
    let messages = &relay.config().messages;
    vec![
        format!(
            "{:<width$}{}",
            messages.cmd_command,
            messages.cmd_description,
            width = HELP_COLUMN_WIDTH
        ),
        format!(
            "{:<width$}{}",
            format!("{} loadconfig", COMMAND_NAME),
            messages.cmd_reload,
            width = HELP_COLUMN_WIDTH
        ),
    ]
}
