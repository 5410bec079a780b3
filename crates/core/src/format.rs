//! Display formatting applied at the adapter boundary.

pub const CURRENCY_CODE: &str = "KES";

/// Thousands-separated integer, e.g. `2400 -> "2,400"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rounds a float to the nearest integer and formats it with separators.
/// Negative and non-finite input clamps to zero.
pub fn format_rounded(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }
    format_count(value.round() as u64)
}

/// Currency value prefixed with the reporting currency code.
pub fn format_currency(value: f64) -> String {
    format!("{CURRENCY_CODE} {}", format_rounded(value))
}

/// Percentage with one decimal place; `value` is already in percent units.
pub fn format_percent(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{value:.1}%")
}

/// Signed percent change, e.g. `+8%` / `-2%`.
pub fn format_change(percent: i64) -> String {
    if percent < 0 {
        format!("{percent}%")
    } else {
        format!("+{percent}%")
    }
}

/// Compact follower-style count, e.g. `10500 -> "10.5K"`.
pub fn format_compact(value: u64) -> String {
    match value {
        0..=999 => value.to_string(),
        1_000..=999_999 => format!("{:.1}K", value as f64 / 1_000.0),
        _ => format!("{:.1}M", value as f64 / 1_000_000.0),
    }
}

/// Recover the numeric magnitude from a formatted display string.
/// Everything except digits, `.` and `-` is stripped, then the longest
/// parseable prefix wins (`"12-3"` reads as 12). Unparseable input is 0.
pub fn extract_number(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
