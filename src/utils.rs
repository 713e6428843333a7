// Utility functions
use chrono::NaiveDate;

/// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").ok()
}

/// Parses a price cell: `Some(None)` for a blank cell, `None` when the text is not a finite number.
pub fn parse_price(text: &str) -> Option<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
}

/// Rounds to two decimal places (cents).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
