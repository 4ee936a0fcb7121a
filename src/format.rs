//! Rendering of reports into Telegram HTML messages.

use crate::report::{Mode, Report};

pub const NO_STOCKS_LINE: &str = "(no entries)";
pub const NO_ORDERS_LINE: &str = "(no reorder items)";

/// Escape the characters Telegram's HTML parse mode treats as markup.
///
/// `&` goes first so the entities produced for `<` and `>` are not escaped again.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn header(report: &Report, title: &str) -> String {
    let when = format!("{} {}", report.date.trim(), report.time.trim());
    let when = match when.trim() {
        "" => "-",
        w => w,
    };

    let mut head = format!(
        "📦 <b>{}</b>\nBranch: {}\nMode: {}\nTime: {}",
        title,
        escape_html(&report.branch),
        report.mode.label(),
        escape_html(when),
    );
    if report.progress > 0 {
        head.push_str(&format!("\nProgress: {}%", report.progress));
    }
    head
}

pub fn format_stock_message(report: &Report) -> String {
    let title = match report.mode {
        Mode::Open => "Stock check (opening)",
        Mode::Close => "Remaining stock entered",
    };
    let head = header(report, title);

    if report.stocks.is_empty() {
        return format!("{head}\n\n{NO_STOCKS_LINE}");
    }

    let lines: Vec<String> = report
        .stocks
        .iter()
        .map(|s| {
            format!(
                "• {}: {} {}",
                escape_html(&s.name),
                escape_html(&s.value),
                escape_html(&s.unit)
            )
            .trim_end()
            .to_string()
        })
        .collect();

    format!("{head}\n\n{}", lines.join("\n"))
}

pub fn format_order_message(report: &Report) -> String {
    let head = header(report, "Reorder summary");

    if report.orders.is_empty() {
        return format!("{head}\n\n{NO_ORDERS_LINE}");
    }

    let lines: Vec<String> = report
        .orders
        .iter()
        .map(|item| format!("• {}", escape_html(item)))
        .collect();

    format!("{head}\n\n{}", lines.join("\n"))
}
