use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Relay configuration. Owned by the relay and never mutated in place; a
/// reload replaces it wholesale. Sends copy the values they need.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_bot_token")]
    pub telegram_bot_token: String,
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub enable_global_chat: bool,
    #[serde(default = "default_true")]
    pub enable_team_chat: bool,
    #[serde(default = "default_true")]
    pub enable_connections: bool,
    #[serde(default = "default_global_chat_format")]
    pub global_chat_format: String,
    #[serde(default = "default_team_chat_format")]
    pub team_chat_format: String,
    #[serde(default = "default_connection_format")]
    pub connection_format: String,
    /// chrono strftime pattern used for `{time}`
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Bot API base URL, without the `/bot<token>` path
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub messages: Messages,
}

/// Localized strings shown to players or used in relayed text.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Messages {
    #[serde(default = "default_connected")]
    pub connected: String,
    #[serde(default = "default_disconnected")]
    pub disconnected: String,
    #[serde(default = "default_no_permission")]
    pub no_permission: String,
    #[serde(default = "default_file_loaded")]
    pub file_loaded: String,
    #[serde(default = "default_cmd_command")]
    pub cmd_command: String,
    #[serde(default = "default_cmd_description")]
    pub cmd_description: String,
    #[serde(default = "default_cmd_reload")]
    pub cmd_reload: String,
}

// The token and chat id default to the pages explaining how to obtain them.
fn default_bot_token() -> String {
    "https://core.telegram.org/bots/features#creating-a-new-bot".to_string()
}

fn default_chat_id() -> String {
    "https://www.alphr.com/find-chat-id-telegram/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_global_chat_format() -> String {
    "<b>[{time}] [GLOBAL] {username}:</b> {message}".to_string()
}

fn default_team_chat_format() -> String {
    "<b>[{time}] [TEAM] {username}:</b> {message}".to_string()
}

fn default_connection_format() -> String {
    "<b>[{time}] {username}:</b> {connectionstatus}".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_connected() -> String {
    "Connected.".to_string()
}

fn default_disconnected() -> String {
    "Disconnected.".to_string()
}

fn default_no_permission() -> String {
    "You do not have permission to use this command.".to_string()
}

fn default_file_loaded() -> String {
    "File loaded.".to_string()
}

fn default_cmd_command() -> String {
    "COMMAND".to_string()
}

fn default_cmd_description() -> String {
    "DESCRIPTION".to_string()
}

fn default_cmd_reload() -> String {
    "Reads the config file.".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_bot_token: default_bot_token(),
            chat_id: default_chat_id(),
            enable_global_chat: true,
            enable_team_chat: true,
            enable_connections: true,
            global_chat_format: default_global_chat_format(),
            team_chat_format: default_team_chat_format(),
            connection_format: default_connection_format(),
            date_format: default_date_format(),
            api_url: default_api_url(),
            messages: Messages::default(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            connected: default_connected(),
            disconnected: default_disconnected(),
            no_permission: default_no_permission(),
            file_loaded: default_file_loaded(),
            cmd_command: default_cmd_command(),
            cmd_description: default_cmd_description(),
            cmd_reload: default_cmd_reload(),
        }
    }
}

impl Config {
    /// Endpoint for `sendMessage` with the bot token spliced into the path.
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.telegram_bot_token
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config, writing the defaults to `path` first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No config file at {}, writing defaults",
                path.display()
            );
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}
