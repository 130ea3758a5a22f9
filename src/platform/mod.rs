pub mod telegram;

use serde::Deserialize;

/// Chat channel a player message was sent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    Global,
    Team,
    /// Any other host channel (server, clan, ...); never relayed
    #[serde(other)]
    Other,
}

/// A chat message fired by the host. Handled immediately, never stored.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub channel: ChatChannel,
    /// Display name of the player
    pub player_name: String,
    /// Raw, untrusted message text
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    Connected,
    Disconnected,
}

/// A player joining or leaving the server
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    pub player_name: String,
    pub direction: ConnectionDirection,
}
