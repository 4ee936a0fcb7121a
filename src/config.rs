use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::chunk::DEFAULT_MAX_MESSAGE_LEN;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Required for sending; checked per request so the liveness probe works without it.
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Generic destination used when a category chat is not set.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub chat_id_open: Option<String>,
    #[serde(default)]
    pub chat_id_orders: Option<String>,
    #[serde(default)]
    pub chat_id_stocks: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            chat_id_open: None,
            chat_id_orders: None,
            chat_id_stocks: None,
            api_base_url: default_api_base_url(),
            max_message_len: default_max_message_len(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_max_message_len() -> usize {
    DEFAULT_MAX_MESSAGE_LEN
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

impl Config {
    /// Load `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.normalize();
        Ok(config)
    }

    /// Overlay values from a variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tg = &mut self.telegram;
        for (key, slot) in [
            ("TELEGRAM_TOKEN", &mut tg.bot_token),
            ("TELEGRAM_CHAT_ID", &mut tg.chat_id),
            ("TELEGRAM_CHAT_ID_OPEN", &mut tg.chat_id_open),
            ("TELEGRAM_CHAT_ID_ORDERS", &mut tg.chat_id_orders),
            ("TELEGRAM_CHAT_ID_STOCKS", &mut tg.chat_id_stocks),
        ] {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        if let Some(url) = get("TELEGRAM_API_URL") {
            tg.api_base_url = url;
        }
        if let Some(bind) = get("RELAY_BIND") {
            self.server.bind = bind;
        }
    }

    /// Treat blank strings from the file as unset.
    fn normalize(&mut self) {
        let tg = &mut self.telegram;
        for slot in [
            &mut tg.bot_token,
            &mut tg.chat_id,
            &mut tg.chat_id_open,
            &mut tg.chat_id_orders,
            &mut tg.chat_id_stocks,
        ] {
            if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *slot = None;
            }
        }
        tg.api_base_url = tg.api_base_url.trim_end_matches('/').to_string();
        if tg.max_message_len == 0 {
            tg.max_message_len = DEFAULT_MAX_MESSAGE_LEN;
        }
    }
}
