//! Formatting helpers shared by reports.

use chrono::{DateTime, Utc};

/// Format a millisecond duration compactly (e.g., "3d 4h", "12m", "45s").
pub fn format_duration_ms(ms: f64) -> String {
    if !ms.is_finite() || ms <= 0.0 {
        return "0s".to_string();
    }
    let secs = (ms / 1000.0).round() as i64;
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", secs)
    }
}

/// Format a delta percentage with an explicit sign (e.g., "+23%" or "-15%").
pub fn format_delta_percent(delta: f64) -> String {
    if delta >= 0.0 {
        format!("+{:.0}%", delta)
    } else {
        format!("{:.0}%", delta)
    }
}

/// Format a millisecond timestamp as a UTC date (e.g., "2024-03-09").
pub fn format_date_ms(ts_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}
