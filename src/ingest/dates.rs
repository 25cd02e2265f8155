// src/ingest/dates.rs
//! Timestamp extraction for feed entries.
//!
//! Feeds in the wild mix RFC 2822, RFC 3339 and a long tail of
//! "almost" formats. The parser fills `RawEntry::published`/`updated`
//! only from the two standard formats; [`resolve_published`] then falls
//! back to re-reading the raw strings with the lenient [`parse_feed_date`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::RawEntry;

type DateAccessor = fn(&RawEntry) -> Option<DateTime<Utc>>;

/// Candidates tried in order; the first one yielding a timestamp wins.
const RESOLUTION_ORDER: [(&str, DateAccessor); 5] = [
    ("published_parsed", published_parsed),
    ("updated_parsed", updated_parsed),
    ("published", raw_published),
    ("updated", raw_updated),
    ("pubDate", raw_pub_date),
];

fn published_parsed(e: &RawEntry) -> Option<DateTime<Utc>> {
    e.published
}

fn updated_parsed(e: &RawEntry) -> Option<DateTime<Utc>> {
    e.updated
}

fn raw_published(e: &RawEntry) -> Option<DateTime<Utc>> {
    e.field("published").and_then(parse_feed_date)
}

fn raw_updated(e: &RawEntry) -> Option<DateTime<Utc>> {
    e.field("updated").and_then(parse_feed_date)
}

fn raw_pub_date(e: &RawEntry) -> Option<DateTime<Utc>> {
    e.field("pubDate").and_then(parse_feed_date)
}

/// Single authoritative UTC timestamp for an entry, or `None` when no
/// candidate parses. Undated entries are never delivered.
pub fn resolve_published(entry: &RawEntry) -> Option<DateTime<Utc>> {
    RESOLUTION_ORDER.iter().find_map(|(name, get)| {
        let ts = get(entry)?;
        tracing::trace!(target: "watch", candidate = *name, %ts, "date resolved");
        Some(ts)
    })
}

fn from_offset_datetime(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// Strict RFC 2822 (`pubDate` in RSS 2.0).
pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(from_offset_datetime)
}

/// Strict RFC 3339 (Atom `published`/`updated`, `dc:date`).
pub fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .and_then(from_offset_datetime)
}

const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

// Zone-less layouts are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn zone_suffix_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*(?:UTC|GMT|UT|Z)$").expect("zone suffix regex"))
}

fn weekday_prefix_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,9},?\s+").expect("weekday prefix regex"))
}

/// Lenient feed-date parser used on raw string fields. A day name that
/// disagrees with the date is ignored.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_lenient(s).or_else(|| {
        let rest = weekday_prefix_re().replace(s, "");
        (rest.len() < s.len())
            .then(|| parse_lenient(&rest))
            .flatten()
    })
}

fn parse_lenient(s: &str) -> Option<DateTime<Utc>> {

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = zone_suffix_re().replace(s, "");
    let naive = naive.trim();
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn strict_parsers_accept_standard_forms() {
        assert_eq!(
            parse_rfc2822("Sat, 06 Sep 2025 09:00:00 +0200"),
            Some(utc(2025, 9, 6, 7, 0, 0))
        );
        assert_eq!(
            parse_rfc3339("2025-09-06T09:00:00Z"),
            Some(utc(2025, 9, 6, 9, 0, 0))
        );
        assert_eq!(parse_rfc3339("2025-09-06 09:00"), None);
    }

    #[test]
    fn lenient_parser_handles_common_variants() {
        let want = utc(2025, 9, 6, 9, 0, 0);
        for s in [
            "Sat, 06 Sep 2025 09:00:00 GMT",
            "Sat, 06 Sep 2025 09:00:00 UTC",
            "06 Sep 2025 09:00:00 +0000",
            "2025-09-06T09:00:00",
            "2025-09-06 09:00:00",
            "2025-09-06 09:00",
            "2025-09-06T12:00:00+03:00",
        ] {
            assert_eq!(parse_feed_date(s), Some(want), "input: {s}");
        }
        assert_eq!(parse_feed_date("2025-09-06"), Some(utc(2025, 9, 6, 0, 0, 0)));
        assert_eq!(parse_feed_date("yesterday-ish"), None);
        assert_eq!(parse_feed_date("Monday"), None);
        assert_eq!(parse_feed_date("   "), None);
    }

    #[test]
    fn mismatched_day_name_is_ignored() {
        // 2025-09-08 is a Monday
        let want = utc(2025, 9, 8, 7, 0, 0);
        for s in [
            "Tue, 08 Sep 2025 07:00:00 GMT",
            "Tue, 08 Sep 2025 07:00:00 +0000",
            "Tuesday, 08 Sep 2025 10:00:00 +0300",
            "Tue, 08 Sep 2025 07:00",
        ] {
            assert_eq!(parse_feed_date(s), Some(want), "input: {s}");
        }
    }

    #[test]
    fn resolution_prefers_structured_then_raw_fields_in_order() {
        let structured = utc(2025, 9, 6, 9, 0, 0);
        let mut e = RawEntry {
            updated: Some(structured),
            ..Default::default()
        };
        e.fields
            .insert("published".into(), "2025-01-01 00:00".into());
        assert_eq!(resolve_published(&e), Some(structured));

        e.updated = None;
        assert_eq!(resolve_published(&e), Some(utc(2025, 1, 1, 0, 0, 0)));

        // an unparsable candidate is skipped, not fatal
        e.fields.insert("published".into(), "garbage".into());
        e.fields
            .insert("pubDate".into(), "Sat, 06 Sep 2025 09:00:00 GMT".into());
        assert_eq!(resolve_published(&e), Some(structured));
    }

    #[test]
    fn entry_without_any_date_resolves_to_none() {
        let mut e = RawEntry::default();
        e.fields.insert("title".into(), "no date here".into());
        assert_eq!(resolve_published(&e), None);
    }
}
