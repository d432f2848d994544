//! Human-readable formatting for durations, sizes and timestamps

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const BYTE_UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Format a count of seconds as `1h1m1s`, `1m5s` or `5s`
pub fn fmt_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Format a size with three significant digits.
///
/// The scale starts at KB: the value is divided by 1024 until it drops
/// below 1024 or the PB unit is reached, so `1536` renders as `1.50 MB`.
pub fn fmt_bytes(amount: u64) -> String {
    let mut value = amount as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", to_precision(value, 3), BYTE_UNITS[unit])
}

/// Named number formats understood by [`fmt_number`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Duration,
    Bytes,
    Plain,
}

impl NumberKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "duration" => NumberKind::Duration,
            "bytes" => NumberKind::Bytes,
            _ => NumberKind::Plain,
        }
    }
}

/// Format `value` according to the named `kind`; unknown kinds get three
/// decimal places.
pub fn fmt_number(kind: &str, value: f64) -> String {
    match NumberKind::from_name(kind) {
        // `as` saturates: negatives become 0
        NumberKind::Duration => fmt_duration(value as u64),
        NumberKind::Bytes => fmt_bytes(value as u64),
        NumberKind::Plain => format!("{:.3}", value),
    }
}

/// `YYYY-MM-DD HH:MM:SS` in the timestamp's own zone
pub fn timestamp_string<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render `value` with `digits` significant digits, never switching to
/// exponent notation.
fn to_precision(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return format!("{:.*}", digits.saturating_sub(1), 0.0);
    }

    let magnitude = value.abs().log10().floor() as i32 + 1;
    let decimals = (digits as i32 - magnitude).max(0) as usize;
    let rendered = format!("{:.*}", decimals, value);

    // 9.996 rounds up to 10.00, one digit too many
    if decimals > 0 {
        if let Ok(rounded) = rendered.parse::<f64>() {
            if rounded.abs() >= 10f64.powi(magnitude) {
                return format!("{:.*}", decimals - 1, value);
            }
        }
    }
    rendered
}
