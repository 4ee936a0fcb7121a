use serde::Serialize;
use tracing::warn;

use crate::config::TelegramConfig;
use crate::error::{RelayError, Result};
use crate::report::Mode;

/// The two kinds of message a report can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Stocks,
    Orders,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Stocks => write!(f, "stocks"),
            MessageKind::Orders => write!(f, "orders"),
        }
    }
}

/// Configured destination chats. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatIds {
    pub fallback: Option<String>,
    pub open: Option<String>,
    pub orders: Option<String>,
    pub stocks: Option<String>,
}

impl ChatIds {
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self {
            fallback: config.chat_id.clone(),
            open: config.chat_id_open.clone(),
            orders: config.chat_id_orders.clone(),
            stocks: config.chat_id_stocks.clone(),
        }
    }

    fn first_of<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
        candidates
            .iter()
            .copied()
            .filter_map(Option::as_deref)
            .map(str::trim)
            .find(|id| !id.is_empty())
    }
}

/// Where each message of one report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Stock message destination; always present.
    pub stocks: String,
    /// Order message destination; `None` means the order message is not sent.
    pub orders: Option<String>,
}

/// Resolve destinations for a report.
///
/// Open reports only carry the stock message (open, then stocks, then fallback).
/// Close reports send stocks (stocks, then open, then fallback) and orders
/// (orders, then fallback). A missing stock chat is an error; a missing order
/// chat only skips that message.
pub fn plan_routes(mode: Mode, ids: &ChatIds) -> Result<RoutePlan> {
    let stocks = match mode {
        Mode::Open => ChatIds::first_of(&[&ids.open, &ids.stocks, &ids.fallback]),
        Mode::Close => ChatIds::first_of(&[&ids.stocks, &ids.open, &ids.fallback]),
    }
    .ok_or(RelayError::MissingDestination(MessageKind::Stocks))?
    .to_string();

    let orders = match mode {
        Mode::Open => None,
        Mode::Close => {
            let orders = ChatIds::first_of(&[&ids.orders, &ids.fallback]).map(str::to_string);
            if orders.is_none() {
                warn!("No orders chat configured, skipping reorder summary");
            }
            orders
        }
    };

    Ok(RoutePlan { stocks, orders })
}
