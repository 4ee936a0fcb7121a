use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::dispatcher::{Delivery, ReportDispatcher};
use crate::error::Result;
use crate::report::Report;
use crate::route::MessageKind;

/// Path the web form used when this ran as a hosted function.
const LEGACY_PATH: &str = "/.netlify/functions/telegram";

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct Ack {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct DispatchResponse {
    ok: bool,
    sent: Vec<Delivery>,
    skipped: Vec<MessageKind>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness).post(submit_report))
        .route(LEGACY_PATH, get(liveness).post(submit_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> Json<Ack> {
    Json(Ack {
        ok: true,
        service: "stock-relay",
    })
}

async fn submit_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DispatchResponse>> {
    // Token is checked before the body is even looked at.
    let dispatcher = ReportDispatcher::from_config(&state.config.telegram, state.client.clone())?;

    let report = Report::from_body(&body);
    info!(
        "Report from branch {} ({}): {} stock line(s), {} order(s)",
        report.branch,
        report.mode,
        report.stocks.len(),
        report.orders.len()
    );

    let summary = dispatcher.dispatch(&report).await?;

    Ok(Json(DispatchResponse {
        ok: true,
        sent: summary.deliveries,
        skipped: summary.skipped,
    }))
}
