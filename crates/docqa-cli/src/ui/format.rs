//! Formatting utilities for CLI output.

use chrono::{DateTime, Local, Utc};

/// Truncate to at most `max_chars` characters, ending in `...` when cut.
///
/// Newlines are flattened to spaces so table cells stay on one line.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let kept: String = flat.chars().take(max_chars - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Local wall-clock time, e.g. `2025-03-01 14:05`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// A metric value with four decimals.
pub fn format_metric(value: f64) -> String {
    format!("{:.4}", value)
}

/// Mask a secret, keeping only its last four characters.
pub fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}
