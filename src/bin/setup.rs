//! Stock relay setup helper.
//!
//! Asks for the bot token and destination chats on the terminal and writes a
//! `config.toml` the relay picks up on start. Environment variables still
//! override whatever ends up in the file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    chat_id: &'a str,
    chat_id_open: &'a str,
    chat_id_orders: &'a str,
    chat_id_stocks: &'a str,
    bind: &'a str,
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    telegram: TelegramSection<'a>,
    server: ServerSection<'a>,
}

#[derive(Serialize)]
struct TelegramSection<'a> {
    bot_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id_open: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id_orders: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id_stocks: Option<&'a str>,
    max_message_len: u32,
}

#[derive(Serialize)]
struct ServerSection<'a> {
    bind: &'a str,
}

/// Blank answers are left out of the file.
fn optional(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.is_empty())
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> Result<String> {
    let file = ConfigFile {
        telegram: TelegramSection {
            bot_token: p.bot_token,
            chat_id: optional(p.chat_id),
            chat_id_open: optional(p.chat_id_open),
            chat_id_orders: optional(p.chat_id_orders),
            chat_id_stocks: optional(p.chat_id_stocks),
            max_message_len: 3500,
        },
        server: ServerSection { bind: p.bind },
    };

    let body = toml::to_string(&file).context("Failed to serialize config")?;
    Ok(format!("# Generated by relay-setup. TELEGRAM_* variables override these values.\n{body}"))
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    println!("=== Stock Relay Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let bot_token = read_line("Telegram bot token: ")?;
    if bot_token.is_empty() {
        anyhow::bail!("A bot token is required");
    }
    let chat_id = read_line("Fallback chat id (optional): ")?;
    let chat_id_open = read_line("Opening check chat id (optional): ")?;
    let chat_id_orders = read_line("Reorder summary chat id (optional): ")?;
    let chat_id_stocks = read_line("Remaining stock chat id (optional): ")?;
    let bind = match read_line("Listen address [127.0.0.1:8787]: ")? {
        s if s.is_empty() => "127.0.0.1:8787".to_owned(),
        s => s,
    };

    if chat_id.is_empty() && chat_id_open.is_empty() && chat_id_stocks.is_empty() {
        println!("\n!  No chat can receive stock reports yet; every report will fail until one is set.");
    }

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        chat_id: &chat_id,
        chat_id_open: &chat_id_open,
        chat_id_orders: &chat_id_orders,
        chat_id_stocks: &chat_id_stocks,
        bind: &bind,
    })?;

    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config saved to {}", config_path.display());
    println!("   Run the relay with:  cargo run --bin stock-relay");
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
