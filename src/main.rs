//! slirc-logbot - Straylight channel logbot.

use slirc_logbot::config::{Config, validate};
use slirc_logbot::log::SessionGuard;
use slirc_logbot::{BotState, client, irc};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "logbot.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    let config = Arc::new(config);
    info!(
        nick = %config.bot.nick,
        server = %config.server.address,
        channels = config.server.channels.len(),
        log_dir = %config.log.dir.display(),
        "Starting slirc-logbot"
    );

    let (bot, outbound) = BotState::new(Arc::clone(&config)).map_err(|e| {
        error!(error = %e, "Failed to prepare log directory");
        e
    })?;

    // Every log file is closed when this drops, however we leave main.
    let _logs = SessionGuard::new(Arc::clone(&bot.logs));

    let stream = irc::connect(&config.server).await.map_err(|e| {
        error!(code = e.error_code(), error = %e, "Failed to connect");
        e
    })?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    client::run(stream, bot, outbound, shutdown)
        .await
        .map_err(|e| {
            error!(code = e.error_code(), error = %e, "Bot stopped");
            e
        })?;

    info!("Bye");
    Ok(())
}
