//! Formatting helpers shared across UIs.

use chrono::NaiveDate;

/// Format a completion rate as a percentage (e.g., "82%").
pub fn format_rate(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Format a period-over-period change (e.g., "+23%" or "-15%"), or an em
/// dash when there is no prior data to compare against.
pub fn format_rate_change(change: Option<f64>) -> String {
    match change {
        Some(delta) if delta >= 0.0 => format!("+{:.0}%", delta * 100.0),
        Some(delta) => format!("{:.0}%", delta * 100.0),
        None => "—".to_string(),
    }
}

/// Format a day for display (e.g., "Feb 07").
pub fn format_day(day: NaiveDate) -> String {
    day.format("%b %d").to_string()
}
