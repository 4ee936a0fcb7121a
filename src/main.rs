mod chunk;
mod config;
mod dispatcher;
mod error;
mod format;
mod report;
mod route;
mod server;
mod telegram;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stock_relay=debug,tower_http=debug".into()),
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

    let tg = &config.telegram;
    if tg.bot_token.is_none() {
        warn!("TELEGRAM_TOKEN is not set; reports will be rejected until it is");
    }
    info!("  Telegram API: {}", tg.api_base_url);
    info!("  Fallback chat: {:?}", tg.chat_id);
    info!("  Open chat: {:?}", tg.chat_id_open);
    info!("  Orders chat: {:?}", tg.chat_id_orders);
    info!("  Stocks chat: {:?}", tg.chat_id_stocks);
    info!("  Max message length: {}", tg.max_message_len);

    let bind = config.server.bind.clone();
    let app = server::router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("Stock relay listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
