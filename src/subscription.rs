use std::collections::BTreeSet;
use std::fmt;

use tracing::info;

use crate::config::Config;

/// Event callbacks the relay can attach to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Listener {
    PlayerChat,
    UserConnected,
    UserDisconnected,
}

impl Listener {
    pub const ALL: [Listener; 3] = [
        Listener::PlayerChat,
        Listener::UserConnected,
        Listener::UserDisconnected,
    ];
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::PlayerChat => write!(f, "OnPlayerChat"),
            Listener::UserConnected => write!(f, "OnUserConnected"),
            Listener::UserDisconnected => write!(f, "OnUserDisconnected"),
        }
    }
}

/// Listeners that should be attached for the given flags.
///
/// Chat is attached while either chat category is enabled; both connection
/// listeners follow the single connections flag.
pub fn active_listeners(config: &Config) -> BTreeSet<Listener> {
    let mut active = BTreeSet::new();
    if config.enable_global_chat || config.enable_team_chat {
        active.insert(Listener::PlayerChat);
    }
    if config.enable_connections {
        active.insert(Listener::UserConnected);
        active.insert(Listener::UserDisconnected);
    }
    active
}

/// The set of listeners currently attached.
#[derive(Debug, Default)]
pub struct Subscriptions {
    attached: BTreeSet<Listener>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    /// Make the attached set equal to `desired`.
    ///
    /// Attaching an attached listener or detaching a detached one is a no-op,
    /// so applying the same set twice changes nothing.
    pub fn apply(&mut self, desired: &BTreeSet<Listener>) {
        for listener in Listener::ALL {
            let want = desired.contains(&listener);
            if want && self.attached.insert(listener) {
                info!("Subscribed to {}", listener);
            } else if !want && self.attached.remove(&listener) {
                info!("Unsubscribed from {}", listener);
            }
        }
    }

    /// Re-derive the attached set from `config` alone.
    pub fn refresh(&mut self, config: &Config) {
        self.apply(&active_listeners(config));
    }
}
