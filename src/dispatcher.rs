use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, Instrument};

use crate::chunk::{split_message, DEFAULT_MAX_MESSAGE_LEN};
use crate::config::TelegramConfig;
use crate::error::{RelayError, Result};
use crate::format::{format_order_message, format_stock_message};
use crate::report::{Mode, Report};
use crate::route::{plan_routes, ChatIds, MessageKind};
use crate::telegram::{MessageSender, TelegramClient};

/// One message that reached its chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub kind: MessageKind,
    pub chat_id: String,
    pub chunks: usize,
}

/// What a dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub deliveries: Vec<Delivery>,
    pub skipped: Vec<MessageKind>,
}

/// Formats a report and forwards it to the configured chats.
pub struct ReportDispatcher {
    chat_ids: ChatIds,
    sender: Arc<dyn MessageSender>,
    max_message_len: usize,
}

impl ReportDispatcher {
    pub fn new(chat_ids: ChatIds, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            chat_ids,
            sender,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }

    pub fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len;
        self
    }

    /// Build a dispatcher talking to the Bot API. Fails when no token is set.
    pub fn from_config(config: &TelegramConfig, client: reqwest::Client) -> Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(RelayError::MissingToken)?;

        let sender = TelegramClient::new(client, &config.api_base_url, token);
        Ok(Self::new(ChatIds::from_config(config), Arc::new(sender))
            .with_max_message_len(config.max_message_len))
    }

    /// Send the report. Routes are resolved before anything is sent; the
    /// first failed send stops the dispatch.
    pub async fn dispatch(&self, report: &Report) -> Result<DispatchSummary> {
        let span = tracing::info_span!(
            "dispatch",
            id = %uuid::Uuid::new_v4(),
            branch = %report.branch,
            mode = %report.mode,
        );

        async move {
            let plan = plan_routes(report.mode, &self.chat_ids)?;
            let mut summary = DispatchSummary::default();

            let stocks = format_stock_message(report);
            let chunks = self.send(&plan.stocks, &stocks).await?;
            summary.deliveries.push(Delivery {
                kind: MessageKind::Stocks,
                chat_id: plan.stocks.clone(),
                chunks,
            });

            match &plan.orders {
                Some(chat_id) => {
                    let orders = format_order_message(report);
                    let chunks = self.send(chat_id, &orders).await?;
                    summary.deliveries.push(Delivery {
                        kind: MessageKind::Orders,
                        chat_id: chat_id.clone(),
                        chunks,
                    });
                }
                None if report.mode == Mode::Close => {
                    summary.skipped.push(MessageKind::Orders);
                }
                None => {}
            }

            info!(
                "Dispatched {} message(s), skipped {}",
                summary.deliveries.len(),
                summary.skipped.len()
            );
            Ok::<_, RelayError>(summary)
        }
        .instrument(span)
        .await
    }

    /// Send `text` to `chat_id` chunk by chunk, in order. Returns the number of chunks sent.
    async fn send(&self, chat_id: &str, text: &str) -> Result<usize> {
        let chunks = split_message(text, self.max_message_len);
        let mut sent = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                debug!("Skipping blank chunk {}", i);
                continue;
            }
            self.sender.send_message(chat_id, chunk).await?;
            debug!("Sent chunk {}/{} to {}", i + 1, chunks.len(), chat_id);
            sent += 1;
        }

        info!("Delivered {} chunk(s) to chat {}", sent, chat_id);
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StockEntry;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Records every send; fails the call with index `fail_at` if set.
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
            let mut sent = self.sent.lock().await;
            if self.fail_at == Some(sent.len()) {
                return Err(RelayError::Provider("Too Many Requests".to_string()));
            }
            sent.push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn chat_ids(fallback: Option<&str>, orders: Option<&str>, stocks: Option<&str>) -> ChatIds {
        ChatIds {
            fallback: fallback.map(String::from),
            open: None,
            orders: orders.map(String::from),
            stocks: stocks.map(String::from),
        }
    }

    fn close_report() -> Report {
        Report {
            branch: "A".to_string(),
            mode: Mode::Close,
            stocks: vec![StockEntry {
                name: "Milk".to_string(),
                value: "2".to_string(),
                unit: "L".to_string(),
            }],
            orders: vec!["Sugar".to_string()],
            ..Report::default()
        }
    }

    #[tokio::test]
    async fn test_open_report_sends_only_stock_message() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = ReportDispatcher::new(chat_ids(Some("fb"), None, None), sender.clone());

        let report = Report {
            branch: "A".to_string(),
            mode: Mode::Open,
            stocks: vec![StockEntry {
                name: "Milk".to_string(),
                value: "5".to_string(),
                unit: "L".to_string(),
            }],
            ..Report::default()
        };
        let summary = dispatcher.dispatch(&report).await.unwrap();

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "fb");
        assert!(sent[0].1.contains("Milk: 5 L"));
        assert!(!sent[0].1.contains(crate::format::NO_ORDERS_LINE));
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.deliveries.len(), 1);
    }

    #[tokio::test]
    async fn test_close_report_sends_stocks_then_orders() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher =
            ReportDispatcher::new(chat_ids(Some("fb"), Some("ord"), Some("stk")), sender.clone());

        let summary = dispatcher.dispatch(&close_report()).await.unwrap();

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "stk");
        assert!(sent[0].1.contains("Remaining stock entered"));
        assert_eq!(sent[1].0, "ord");
        assert!(sent[1].1.contains("• Sugar"));
        assert_eq!(
            summary.deliveries.iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![MessageKind::Stocks, MessageKind::Orders]
        );
    }

    #[tokio::test]
    async fn test_close_without_order_chat_skips_orders() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = ReportDispatcher::new(chat_ids(None, None, Some("stk")), sender.clone());

        let summary = dispatcher.dispatch(&close_report()).await.unwrap();

        assert_eq!(sender.sent.lock().await.len(), 1);
        assert_eq!(summary.skipped, vec![MessageKind::Orders]);
    }

    #[tokio::test]
    async fn test_missing_stock_chat_fails_before_sending() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = ReportDispatcher::new(chat_ids(None, Some("ord"), None), sender.clone());

        let err = dispatcher.dispatch(&close_report()).await.unwrap_err();

        assert!(matches!(
            err,
            RelayError::MissingDestination(MessageKind::Stocks)
        ));
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_long_message_is_sent_in_ordered_chunks() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = ReportDispatcher::new(chat_ids(Some("fb"), None, None), sender.clone())
            .with_max_message_len(200);

        let report = Report {
            mode: Mode::Open,
            stocks: (0..60)
                .map(|i| StockEntry {
                    name: format!("Item {i}"),
                    value: i.to_string(),
                    unit: "pcs".to_string(),
                })
                .collect(),
            ..Report::default()
        };
        let summary = dispatcher.dispatch(&report).await.unwrap();

        let sent = sender.sent.lock().await;
        assert!(sent.len() > 1);
        assert_eq!(summary.deliveries[0].chunks, sent.len());
        assert!(sent.iter().all(|(_, text)| text.chars().count() <= 200));

        let rejoined = sent
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(rejoined, format_stock_message(&report));
    }

    #[tokio::test]
    async fn test_blank_chunks_are_not_sent() {
        let sender = Arc::new(RecordingSender::default());
        // "Time: -" is 7 chars, so the blank separator after it lands in a chunk of its own.
        let dispatcher = ReportDispatcher::new(chat_ids(Some("fb"), None, None), sender.clone())
            .with_max_message_len(7);

        let report = Report::default();
        let chunks = split_message(&format_stock_message(&report), 7);
        assert!(chunks.iter().any(|c| c.is_empty()));

        let summary = dispatcher.dispatch(&report).await.unwrap();

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), chunks.len() - 1);
        assert!(sent.iter().all(|(_, text)| !text.trim().is_empty()));
        assert_eq!(summary.deliveries[0].chunks, sent.len());
        assert_eq!(sent.last().unwrap().1, crate::format::NO_STOCKS_LINE);
    }

    #[tokio::test]
    async fn test_send_failure_stops_remaining_sends() {
        let sender = Arc::new(RecordingSender {
            fail_at: Some(0),
            ..Default::default()
        });
        let dispatcher =
            ReportDispatcher::new(chat_ids(Some("fb"), Some("ord"), None), sender.clone());

        let err = dispatcher.dispatch(&close_report()).await.unwrap_err();

        assert!(matches!(err, RelayError::Provider(_)));
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_failure_keeps_stock_delivery() {
        let sender = Arc::new(RecordingSender {
            fail_at: Some(1),
            ..Default::default()
        });
        let dispatcher =
            ReportDispatcher::new(chat_ids(Some("fb"), None, None), sender.clone());

        let err = dispatcher.dispatch(&close_report()).await.unwrap_err();

        assert!(matches!(err, RelayError::Provider(_)));
        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Milk: 2 L"));
    }

    #[test]
    fn test_from_config_requires_token() {
        let config = TelegramConfig::default();
        let result = ReportDispatcher::from_config(&config, reqwest::Client::new());
        assert!(matches!(result, Err(RelayError::MissingToken)));

        let config = TelegramConfig {
            bot_token: Some("  ".to_string()),
            ..TelegramConfig::default()
        };
        let result = ReportDispatcher::from_config(&config, reqwest::Client::new());
        assert!(matches!(result, Err(RelayError::MissingToken)));
    }
}
