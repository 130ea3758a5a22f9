mod command;
mod config;
mod host;
mod platform;
mod relay;
mod sanitize;
mod subscription;
mod template;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::TelegramClient;
use crate::relay::Relay;

/// How long in-flight sends may take to finish once the event stream ends
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chattotelegram=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("chattotelegram.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Chat id: {}", config.chat_id);
    info!(
        "  Global chat: {} | Team chat: {} | Connections: {}",
        config.enable_global_chat, config.enable_team_chat, config.enable_connections
    );

    let telegram = TelegramClient::new();
    let mut relay = Relay::new(config_path, config, Arc::new(telegram.clone()));
    relay.loaded();

    info!("Relay is listening for host events on stdin...");
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    let result = tokio::select! {
        result = host::run(&mut relay, input, output) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    telegram.drain(SHUTDOWN_GRACE).await;
    result
}
