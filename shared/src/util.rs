/// Current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether `as_of` falls inside a `[from, thru)` window.
///
/// An absent bound is open. The thru bound is exclusive so that a record
/// ending at `t` and its successor starting at `t` never both apply.
pub fn within_window(from: Option<i64>, thru: Option<i64>, as_of: i64) -> bool {
    if let Some(from) = from
        && from > as_of
    {
        return false;
    }
    match thru {
        Some(thru) => as_of < thru,
        None => true,
    }
}

/// Whether two `[from, thru)` windows share at least one instant.
pub fn windows_overlap(a: (Option<i64>, Option<i64>), b: (Option<i64>, Option<i64>)) -> bool {
    let a_from = a.0.unwrap_or(i64::MIN);
    let b_from = b.0.unwrap_or(i64::MIN);
    let a_thru = a.1.unwrap_or(i64::MAX);
    let b_thru = b.1.unwrap_or(i64::MAX);
    a_from < b_thru && b_from < a_thru
}

/// Parse an RFC 3339 timestamp into Unix millis.
pub fn parse_millis(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(within_window(None, None, 0));
        assert!(within_window(Some(10), None, 10));
        assert!(!within_window(Some(10), None, 9));
        assert!(within_window(Some(10), Some(20), 19));
        assert!(!within_window(Some(10), Some(20), 20));
    }

    #[test]
    fn test_adjacent_windows_do_not_overlap() {
        assert!(!windows_overlap((Some(0), Some(10)), (Some(10), None)));
        assert!(windows_overlap((Some(0), Some(11)), (Some(10), None)));
        assert!(windows_overlap((None, None), (Some(5), Some(6))));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("2024-01-01T00:00:00Z"), Some(1_704_067_200_000));
        assert_eq!(parse_millis("yesterday"), None);
    }
}
