use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, info};

use crate::config::Config;
use crate::platform::telegram::{Dispatch, OutboundRequest};
use crate::platform::{ChatChannel, ChatEvent, ConnectionDirection, ConnectionEvent};
use crate::sanitize::sanitize_message;
use crate::subscription::{Listener, Subscriptions};
use crate::template::{self, render, CONNECTION_STATUS, MESSAGE, TIME, USERNAME};

/// Turns host events into Telegram messages.
///
/// Event handlers run on the host's event path and never wait on the
/// network: each rendered message is handed to the dispatcher and forgotten.
pub struct Relay {
    config_path: PathBuf,
    config: Config,
    subscriptions: Subscriptions,
    dispatcher: Arc<dyn Dispatch>,
}

impl Relay {
    pub fn new(config_path: PathBuf, config: Config, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            config_path,
            config,
            subscriptions: Subscriptions::new(),
            dispatcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_subscribed(&self, listener: Listener) -> bool {
        self.subscriptions.is_attached(listener)
    }

    /// Attach or detach listeners to match the current config.
    pub fn loaded(&mut self) {
        self.subscriptions.refresh(&self.config);
    }

    /// Re-read the config file and re-run the subscription gate.
    ///
    /// On failure the current config and subscriptions are kept.
    pub fn reload(&mut self) -> Result<()> {
        let config = Config::load(&self.config_path)?;
        info!("Reloaded configuration from {}", self.config_path.display());
        self.config = config;
        self.loaded();
        Ok(())
    }

    pub fn on_player_chat(&self, event: &ChatEvent) {
        if !self.is_subscribed(Listener::PlayerChat) {
            return;
        }

        let format = match event.channel {
            ChatChannel::Global if self.config.enable_global_chat => {
                &self.config.global_chat_format
            }
            ChatChannel::Team if self.config.enable_team_chat => &self.config.team_chat_format,
            _ => {
                debug!(
                    "Not relaying {:?} chat from {}",
                    event.channel, event.player_name
                );
                return;
            }
        };

        let message = sanitize_message(&event.text);
        let time = self.timestamp();
        let text = render(
            format,
            &[
                (TIME, time.as_str()),
                (USERNAME, event.player_name.as_str()),
                (MESSAGE, message.as_str()),
            ],
        );
        self.send(text);
    }

    pub fn on_connection(&self, event: &ConnectionEvent) {
        let (listener, status) = match event.direction {
            ConnectionDirection::Connected => {
                (Listener::UserConnected, &self.config.messages.connected)
            }
            ConnectionDirection::Disconnected => (
                Listener::UserDisconnected,
                &self.config.messages.disconnected,
            ),
        };
        if !self.is_subscribed(listener) {
            return;
        }

        let time = self.timestamp();
        let text = render(
            &self.config.connection_format,
            &[
                (TIME, time.as_str()),
                (USERNAME, event.player_name.as_str()),
                (CONNECTION_STATUS, status.as_str()),
            ],
        );
        self.send(text);
    }

    fn timestamp(&self) -> String {
        template::format_timestamp(&Local::now(), &self.config.date_format)
    }

    fn send(&self, text: String) {
        self.dispatcher.dispatch(OutboundRequest::new(&self.config, text));
    }
}
