use chrono::{DateTime, Local};

/// `1234567` → `"1,234,567"`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Confidence in `[0, 1]` as a percentage with one decimal
pub fn confidence_percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Threat rate as sent by the server, without trailing zeros
pub fn rate_percent(rate: f64) -> String {
    format!("{}%", rate)
}

/// 24-hour local wall-clock time
pub fn clock_time(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}
