mod backend;
mod config;
mod controller;
mod domain;
mod error;
mod pending;
mod platform;
mod render;
mod router;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::BackendGateway;
use crate::config::Config;
use crate::controller::Controller;
use crate::platform::telegram::TelegramTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dugtrio_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let timeouts = config.backend.timeouts();
    info!("Configuration loaded successfully");
    info!("  Backend: {}", config.backend.base_url);
    info!(
        "  Timeouts: sentiment {:?}, lookups {:?}",
        timeouts.sentiment, timeouts.lookup
    );

    let gateway = BackendGateway::new(&config.backend.base_url, timeouts)?;
    let bot = Bot::new(&config.telegram.bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let controller = Arc::new(Controller::new(transport, gateway));

    info!("DugTrio bot is starting...");
    platform::telegram::run(bot, controller).await?;

    Ok(())
}
