//! `Date` field handling: lenient parsing of inbound dates and the
//! canonical RFC 1123 rendering used for outbound ones.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::model::header_map::HeaderMap;

/// Unix timestamp of `0001-01-01T00:00:00Z`, the "zero time" some mail
/// software writes when it has no date.
pub const ZERO_TIME_UNIX: i64 = -62_135_596_800;

/// `Mon, 02 Jan 2006 15:04:05 -0700`
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

const FALLBACK_FORMATS: [&str; 10] = [
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %Z",
    "%d %b %Y %H:%M:%S",
    "%b %d %H:%M:%S %Y",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const NAMED_ZONES: [(&str, &str); 13] = [
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("JST", "+0900"),
];

/// Render a Unix timestamp as RFC 1123 with a numeric zone, in UTC.
///
/// Returns `None` if the timestamp is outside chrono's range.
pub fn format_rfc1123z(unix: i64) -> Option<String> {
    Utc.timestamp_opt(unix, 0)
        .single()
        .map(|dt| dt.format(RFC1123Z).to_string())
}

/// `true` for `0001-01-01T00:00:00Z`.
pub fn is_zero_time(dt: &DateTime<Utc>) -> bool {
    dt.timestamp() == ZERO_TIME_UNIX && dt.timestamp_subsec_nanos() == 0
}

/// Parse the `Date` field of a header block.
///
/// `None` when the field is absent, empty or unparsable.
pub fn header_date(header: &HeaderMap) -> Option<DateTime<Utc>> {
    header
        .get("Date")
        .filter(|d| !d.trim().is_empty())
        .and_then(parse_date)
}

/// Parse the `Date` field strictly as RFC 5322.
///
/// Unlike [`header_date`] there is no fallback to other formats and nothing
/// is logged, so a non-conforming client date simply reads as `None`.
pub fn strict_header_date(header: &HeaderMap) -> Option<DateTime<Utc>> {
    let value = header.get("Date")?;
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an email date string in various common formats.
///
/// Supports RFC 2822, ISO 8601, and many broken real-world variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }
    // chrono reads unknown zone names as UTC, so substitute offsets first
    let zoned = replace_named_tz(trimmed);

    if let Ok(dt) = DateTime::parse_from_rfc2822(&zoned) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&zoned) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(&zoned);
    for candidate in [normalize_imap_date(&no_dow), no_dow] {
        if let Some(dt) = parse_with_formats(&candidate) {
            return Some(dt);
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Try every fallback format; zone-less matches are taken as UTC.
fn parse_with_formats(candidate: &str) -> Option<DateTime<Utc>> {
    for fmt in &FALLBACK_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// Attempt to parse a date using `mail-parser`'s built-in parser.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    use mail_parser::MessageParser;

    // Wrap input in a minimal RFC 5322 message so mail-parser can parse it
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let dt = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Normalize IMAP-style dates: `"16-JUL-2025 03:01:03"` → `"16 Jul 2025 03:01:03"`.
fn normalize_imap_date(s: &str) -> String {
    if !s.contains('-') {
        return s.to_string();
    }
    for month in MONTHS {
        for pattern in [
            format!("-{}-", month.to_uppercase()),
            format!("-{}-", month.to_lowercase()),
            format!("-{month}-"),
        ] {
            if s.contains(&pattern) {
                return s.replacen(&pattern, &format!(" {month} "), 1);
            }
        }
    }
    s.to_string()
}

/// Strip a leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    for day in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
        if let Some(rest) = s.strip_prefix(day) {
            if rest.starts_with(',') || rest.starts_with(' ') {
                return rest.trim_start_matches(',').trim().to_string();
            }
        }
    }
    s.to_string()
}

/// Replace a trailing timezone abbreviation with its numeric offset.
///
/// Only a whole trailing word matches, so `CEST` is never read as `EST`.
fn replace_named_tz(s: &str) -> String {
    if let Some((head, zone)) = s.rsplit_once(' ') {
        if let Some((_, offset)) = NAMED_ZONES.iter().find(|(name, _)| *name == zone) {
            return format!("{head} {offset}");
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rfc1123z() {
        assert_eq!(
            format_rfc1123z(1_704_362_400).as_deref(),
            Some("Thu, 04 Jan 2024 10:00:00 +0000")
        );
        assert_eq!(
            format_rfc1123z(0).as_deref(),
            Some("Thu, 01 Jan 1970 00:00:00 +0000")
        );
    }

    #[test]
    fn test_format_then_parse() {
        let formatted = format_rfc1123z(1_600_000_000).unwrap();
        assert_eq!(parse_date(&formatted).unwrap().timestamp(), 1_600_000_000);
    }

    #[test]
    fn test_is_zero_time() {
        let zero = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        assert!(is_zero_time(&zero));
        assert!(!is_zero_time(&DateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_header_date() {
        let mut h = HeaderMap::new();
        assert!(header_date(&h).is_none());
        h.set("Date", "   ");
        assert!(header_date(&h).is_none());
        h.set("Date", "Thu, 04 Jan 2024 10:00:00 +0000");
        assert_eq!(header_date(&h).unwrap().timestamp(), 1_704_362_400);
    }

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_date_named_tz() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 EST").unwrap();
        assert_eq!(dt.timestamp(), 1_704_362_400 + 5 * 3600);
    }

    #[test]
    fn test_parse_date_zones_outside_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 CEST").unwrap();
        assert_eq!(dt.timestamp(), 1_704_362_400 - 2 * 3600);
        let dt = parse_date("04 Jan 2024 10:00:00 JST").unwrap();
        assert_eq!(dt.timestamp(), 1_704_362_400 - 9 * 3600);
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 CET").unwrap();
        assert_eq!(dt.timestamp(), 1_704_362_400 - 3600);
    }

    #[test]
    fn test_replace_named_tz_whole_word() {
        assert_eq!(replace_named_tz("10:00:00 CEST"), "10:00:00 +0200");
        assert_eq!(replace_named_tz("10:00:00 EST"), "10:00:00 -0500");
        assert_eq!(replace_named_tz("10:00:00 XEST"), "10:00:00 XEST");
        assert_eq!(replace_named_tz("+0200 (CEST)"), "+0200 (CEST)");
    }

    #[test]
    fn test_strict_header_date() {
        let mut h = HeaderMap::new();
        assert!(strict_header_date(&h).is_none());
        h.set("Date", "Thu, 04 Jan 2024 10:00:00 +0000");
        assert_eq!(strict_header_date(&h).unwrap().timestamp(), 1_704_362_400);
        for lenient_only in [
            "2024-01-04T10:00:00Z",
            "2024-01-04 10:00:00",
            "04/01/2024 10:00:00",
            "16-JUL-2025 03:01:03",
        ] {
            h.set("Date", lenient_only);
            assert!(parse_date(lenient_only).is_some());
            assert!(strict_header_date(&h).is_none(), "{lenient_only}");
        }
    }

    #[test]
    fn test_parse_date_iso8601() {
        assert!(parse_date("2024-01-04T10:00:00Z").is_some());
    }

    #[test]
    fn test_parse_date_imap_style() {
        let dt = parse_date("16-JUL-2025 03:01:03").expect("IMAP date");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2025-07-16");
    }

    #[test]
    fn test_normalize_imap_date() {
        assert_eq!(normalize_imap_date("10-MAR-2025 06:00:42"), "10 Mar 2025 06:00:42");
        assert_eq!(normalize_imap_date("04 Jan 2024 10:00:00"), "04 Jan 2024 10:00:00");
    }
}
