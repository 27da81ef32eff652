//! Common utility functions used across the codebase.

use chrono::{DateTime, Utc};

/// Truncates a string to at most `max_chars` characters, adding "..." if truncated.
///
/// UTF-8 safe: respects character boundaries, so multi-byte characters never
/// cause a panic.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    // Fast path: byte length <= max_chars implies char count <= max_chars
    if s.len() <= max_chars {
        return s.to_string();
    }

    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let truncated: String = s.chars().take(keep).collect();
    format!("{}...", truncated)
}

/// Fractional minutes elapsed from `since` to `now`.
pub fn minutes_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_seconds() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        let s = "日本語のテキストです";
        let out = truncate_str(s, 6);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 6);
    }

    #[test]
    fn test_minutes_between() {
        let a = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(minutes_between(a, b), 630.0);
    }

    #[test]
    fn test_minutes_between_fractional() {
        let a = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 30).unwrap();
        assert_eq!(minutes_between(a, b), 0.5);
    }
}
