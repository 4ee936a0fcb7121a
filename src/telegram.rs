use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelayError, Result};

/// Something that can post one text message to one chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// The envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Outcome of a single `sendMessage` call.
#[derive(Debug, PartialEq, Eq)]
enum SendOutcome {
    Delivered,
    Rejected(String),
}

impl From<ApiResponse> for SendOutcome {
    fn from(resp: ApiResponse) -> Self {
        if resp.ok {
            SendOutcome::Delivered
        } else {
            SendOutcome::Rejected(
                resp.description
                    .unwrap_or_else(|| "unknown error".to_string()),
            )
        }
    }
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        debug!("Sending {} chars to chat {}", text.chars().count(), chat_id);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        // Telegram reports failures as `ok: false` with a 4xx status, so the
        // body is decoded before looking at the status code.
        let status = response.status();
        let body = response.text().await?;

        let outcome = match serde_json::from_str::<ApiResponse>(&body) {
            Ok(resp) => SendOutcome::from(resp),
            Err(_) if status.is_success() => SendOutcome::Delivered,
            Err(_) => SendOutcome::Rejected(format!("HTTP {}: {}", status, body.trim())),
        };

        match outcome {
            SendOutcome::Delivered => Ok(()),
            SendOutcome::Rejected(description) => Err(RelayError::Provider(description)),
        }
    }
}
