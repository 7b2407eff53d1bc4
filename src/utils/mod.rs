use chrono::{DateTime, NaiveDateTime};

/// Formats a server timestamp for display. Newer service builds emit
/// RFC 3339 with an offset, older documents a naive `isoformat()` string;
/// anything unparseable is shown verbatim.
pub fn format_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.format("%b %-d, %H:%M").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return parsed.format("%b %-d, %H:%M").to_string();
        }
    }
    trimmed.to_string()
}

/// Probability rendered the way the service rounds it: whole percent.
pub fn percent(probability: f64) -> String {
    format!("{}%", (probability * 100.0).round() as i64)
}

pub fn deposit_label(paid: bool) -> &'static str {
    if paid {
        "paid"
    } else {
        "not paid"
    }
}
