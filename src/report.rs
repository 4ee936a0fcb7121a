use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Which stock check the report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Open,
    Close,
}

impl Mode {
    /// Human label used in message headers.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Open => "Opening",
            Mode::Close => "Closing",
        }
    }

    /// Anything other than "open" counts as a closing report.
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Mode::Open,
            Value::String(s) if s.trim().eq_ignore_ascii_case("open") => Mode::Open,
            _ => Mode::Close,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Open => write!(f, "open"),
            Mode::Close => write!(f, "close"),
        }
    }
}

/// One counted item from the stock form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StockEntry {
    pub name: String,
    pub value: String,
    pub unit: String,
}

/// A stock-check report as submitted by the web form.
///
/// Decoding never fails on field level: missing or oddly typed fields fall
/// back to their defaults so a sloppy form still produces a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawReport")]
pub struct Report {
    pub branch: String,
    pub mode: Mode,
    pub date: String,
    pub time: String,
    /// Percent complete, 0..=100.
    pub progress: u8,
    pub stocks: Vec<StockEntry>,
    pub orders: Vec<String>,
}

impl Default for Report {
    fn default() -> Self {
        RawReport::default().into()
    }
}

impl Report {
    /// Decode a request body. Empty or malformed bodies yield the empty report.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!("Empty request body, using default report");
            return Report::default();
        }

        match serde_json::from_slice::<Report>(body) {
            Ok(report) => report,
            Err(e) => {
                warn!("Malformed report body ({}), using default report", e);
                Report::default()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReport {
    branch: Value,
    mode: Value,
    date: Value,
    time: Value,
    progress: Value,
    stocks: Value,
    orders: Value,
}

impl From<RawReport> for Report {
    fn from(raw: RawReport) -> Self {
        let branch = text(&raw.branch);
        let branch = if branch.trim().is_empty() {
            "-".to_string()
        } else {
            branch
        };

        let stocks = match &raw.stocks {
            Value::Array(items) => items
                .iter()
                .map(|item| StockEntry {
                    name: text(&item["name"]),
                    value: text(&item["value"]),
                    unit: text(&item["unit"]),
                })
                .collect(),
            _ => Vec::new(),
        };

        let orders = match &raw.orders {
            Value::Array(items) => items.iter().map(text).collect(),
            _ => Vec::new(),
        };

        Report {
            branch,
            mode: Mode::from_value(&raw.mode),
            date: text(&raw.date),
            time: text(&raw.time),
            progress: progress(&raw.progress),
            stocks,
            orders,
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            // Whole floats print like integers: 5.0 -> "5".
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn progress(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };
    raw.unwrap_or(0).clamp(0, 100) as u8
}
