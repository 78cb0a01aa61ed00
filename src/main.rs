mod config;
mod lookup;
mod platform;
mod reply;
mod router;

use std::sync::Arc;

use anyhow::Result;
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, ConfigError};
use crate::lookup::LookupClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,numinfo_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; nothing touches the network before this succeeds
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("!!! ERROR: {} !!!", e);
            if matches!(e, ConfigError::MissingToken) {
                error!("Please set BOT_TOKEN to your Telegram bot token and restart.");
            }
            std::process::exit(1);
        }
    };

    let lookup = Arc::new(LookupClient::new(config.lookup.clone()));

    info!("Configuration loaded successfully");
    info!("  Lookup endpoint: {}", lookup.endpoint());
    let bot = Bot::new(&config.bot_token);

    info!("Bot is starting...");
    platform::telegram::run(bot, lookup).await?;

    Ok(())
}
