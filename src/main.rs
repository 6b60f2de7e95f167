mod config;
mod health;
mod platform;
mod responder;
mod voices;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::{self, BotState};
use crate::responder::Responder;
use crate::voices::VoiceLibrary;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,freakyben=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Telegram bot is starting...");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    let library = VoiceLibrary::from_config(&config.voices);
    info!("  Voices: {}", library.directory().display());
    info!("  Trigger: {}", config.voices.trigger);
    info!("  Health: {}", config.health_addr());

    library.ensure_directory().await?;

    // Health listener runs independently of the dispatcher
    health::spawn(config.health_addr())?;

    let bot = Bot::new(&config.telegram.bot_token);
    match telegram::set_commands(&bot).await {
        Ok(()) => info!("Bot commands set successfully"),
        Err(e) => warn!("{:#}", e),
    }

    let state = Arc::new(BotState {
        responder: Responder::new(library, &config.voices.trigger),
        links: config.links.clone(),
        record_delay: Duration::from_millis(config.voices.record_delay_ms),
    });

    info!("Bot is starting...");
    telegram::run(state, bot).await?;

    Ok(())
}
