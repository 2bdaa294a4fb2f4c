//! Flexible duration-string parsing, grounded on the original's
//! `parse_duration_string` grammar: an ordered list of patterns tried in
//! turn, falling back to a bare number of seconds, never raising on
//! malformed input.

use crate::types::Duration;
use chrono::Duration as ChronoDuration;

/// Parses a duration string such as `"140s"`, `"2h"`, `"30m"`, `"1d"`,
/// `"1:30"`, `"1:30:45"`, or a bare number of seconds. Returns `None` for
/// anything that doesn't match, including negative bare numbers (see
/// `SPEC_FULL.md` Open Questions) and empty input. Never panics.
pub fn parse_duration(input: &str) -> Option<Duration> {
    if input.is_empty() {
        return None;
    }
    let v = input.trim().to_lowercase();
    if v.is_empty() {
        return None;
    }

    if let Some(d) = try_unit(&v, "s", &["seconds", "second"]).map(|n| ChronoDuration::seconds(n)) {
        return Some(Duration(d));
    }
    if let Some(d) = try_unit(&v, "m", &["minutes", "minute", "min"]).map(ChronoDuration::minutes) {
        return Some(Duration(d));
    }
    if let Some(d) = try_unit(&v, "h", &["hours", "hour"]).map(ChronoDuration::hours) {
        return Some(Duration(d));
    }
    if let Some(d) = try_unit(&v, "d", &["days", "day"]).map(ChronoDuration::days) {
        return Some(Duration(d));
    }
    if let Some(d) = try_hms(&v) {
        return Some(Duration(d));
    }
    if let Some(d) = try_hm(&v) {
        return Some(Duration(d));
    }

    // Bare number of seconds. Negative values are treated as unparseable:
    // no duration in this domain is ever negative.
    if let Ok(seconds) = v.parse::<f64>() {
        if seconds >= 0.0 && seconds.is_finite() {
            return Some(Duration(ChronoDuration::milliseconds((seconds * 1000.0) as i64)));
        }
        return None;
    }

    None
}

/// Parses a leading run of digits, then checks the remainder matches the
/// bare short suffix (e.g. `"s"`) or one of the long-form suffixes (e.g.
/// `"seconds"`, `"second"`).
fn try_unit(v: &str, short_suffix: &str, long_suffixes: &[&str]) -> Option<i64> {
    let digit_end = v.find(|c: char| !c.is_ascii_digit())?;
    if digit_end == 0 {
        return None;
    }
    let (digits, rest) = v.split_at(digit_end);
    if rest == short_suffix || long_suffixes.contains(&rest) {
        return digits.parse().ok();
    }
    None
}

fn try_hms(v: &str) -> Option<ChronoDuration> {
    let mut parts = v.splitn(3, ':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let s: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ChronoDuration::hours(h) + ChronoDuration::minutes(m) + ChronoDuration::seconds(s))
}

fn try_hm(v: &str) -> Option<ChronoDuration> {
    let mut parts = v.splitn(2, ':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ChronoDuration::hours(h) + ChronoDuration::minutes(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_suffixes() {
        assert_eq!(parse_duration("90s").unwrap().seconds(), 90);
        assert_eq!(parse_duration("2h").unwrap().seconds(), 7200);
        assert_eq!(parse_duration("30m").unwrap().seconds(), 1800);
        assert_eq!(parse_duration("1d").unwrap().seconds(), 86400);
    }

    #[test]
    fn parses_long_suffixes() {
        assert_eq!(parse_duration("140seconds").unwrap().seconds(), 140);
        assert_eq!(parse_duration("2hours").unwrap().seconds(), 7200);
    }

    #[test]
    fn parses_clock_forms() {
        assert_eq!(parse_duration("1:30:00").unwrap().seconds(), 5400);
        assert_eq!(parse_duration("1:30").unwrap().seconds(), 5400);
    }

    #[test]
    fn parses_bare_seconds() {
        assert_eq!(parse_duration("140").unwrap().seconds(), 140);
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert!(parse_duration("").is_none());
        assert!(parse_duration("abc").is_none());
        assert!(parse_duration("-5").is_none());
    }
}
