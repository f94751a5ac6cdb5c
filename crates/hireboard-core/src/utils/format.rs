use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Collapse whitespace runs (including newlines) into single spaces
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Describe a token expiry relative to `now`
pub fn format_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = expires_at - now;
    let minutes = remaining.num_minutes();
    let stamp = expires_at.format("%b %d, %Y %H:%M UTC");

    if remaining.num_seconds() <= 0 {
        format!("expired {}", stamp)
    } else if minutes < 1 {
        format!("{} (in under a minute)", stamp)
    } else if minutes < 60 {
        format!("{} (in {}m)", stamp, minutes)
    } else {
        format!("{} (in {}h {}m)", stamp, minutes / 60, minutes % 60)
    }
}
