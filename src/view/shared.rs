use crate::model::UNAVAILABLE;

/// Truncate a string to at most `max_len` characters (not bytes), appending "..."
/// if truncated. Safe for multi-byte UTF-8.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(keep).collect();
        format!("{}...", truncated)
    }
}

/// Clip a string to at most `max_chars` characters without appending anything.
pub fn clip(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Abbreviate a counter after scaling it by `multiplier`.
///
/// Decimal units, two decimals; at or above 1e12 the cap renders as "N/A".
pub fn size_abr(num: u64, multiplier: u64) -> String {
    let scaled = num.saturating_mul(multiplier);
    let (divisor, suffix) = match scaled {
        n if n < 1_000 => return n.to_string(),
        n if n < 1_000_000 => (1e3, "KB"),
        n if n < 1_000_000_000 => (1e6, "MB"),
        n if n < 1_000_000_000_000 => (1e9, "GB"),
        _ => return UNAVAILABLE.to_string(),
    };
    let value = (scaled as f64 / divisor * 100.0).round() / 100.0;
    format!("{} {}", value, suffix)
}

/// Whole CPU seconds as shown in the CPU column.
pub fn cpu_seconds(secs: u64) -> String {
    format!("{}s", secs)
}
