use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::route::MessageKind;

/// Errors that abort a report dispatch.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No bot token configured.
    #[error("Missing TELEGRAM_TOKEN")]
    MissingToken,

    /// No chat id resolved for a message that must be delivered.
    #[error("No destination chat configured for the {0} message")]
    MissingDestination(MessageKind),

    /// Telegram answered with `ok: false`.
    #[error("Telegram error: {0}")]
    Provider(String),

    /// The request never got a usable answer.
    #[error("Telegram request failed: {0}")]
    Transport(reqwest::Error),
}

// The request URL carries the bot token, so it is stripped before the error
// can reach a log line or a response body.
impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.without_url())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!("Dispatch failed: {}", self);

        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
