// src/ingest/mod.rs
pub mod dates;
pub mod freshness;
pub mod parse;
pub mod pipeline;
pub mod providers;
pub mod trust;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::freshness::{FreshnessWindow, Staleness};
use crate::ingest::trust::{TrustCandidate, TrustPolicy};
use crate::ingest::types::{NormalizedItem, RawEntry};

pub use pipeline::{RunReport, Watcher};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_entries_total", "Entries parsed from feeds.");
        describe_counter!(
            "watch_dropped_total",
            "Entries dropped, labelled by reason (undated/stale/future/untrusted/duplicate)."
        );
        describe_counter!("watch_delivered_total", "Item notifications sent.");
        describe_counter!("watch_feed_errors_total", "Feed fetch/parse failures.");
        describe_counter!("watch_notify_errors_total", "Failed notification sends.");
        describe_counter!("watch_store_errors_total", "State file read/write failures.");
        describe_counter!("watch_heartbeats_total", "No-news heartbeats sent.");
        describe_histogram!("watch_fetch_ms", "Feed fetch time in milliseconds.");
        describe_histogram!("watch_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("watch_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Normalize display text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    let out = re_tags.replace_all(&out, "");

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    let mut out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap: 1000 chars
    if out.chars().count() > 1000 {
        out = out.chars().take(1000).collect();
    }
    out
}

/// Why an entry did not become a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    Undated,
    Stale,
    Future,
    Untrusted,
    Duplicate,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Undated => "undated",
            DropReason::Stale => "stale",
            DropReason::Future => "future",
            DropReason::Untrusted => "untrusted",
            DropReason::Duplicate => "duplicate",
        }
    }
}

impl From<Staleness> for DropReason {
    fn from(s: Staleness) -> Self {
        match s {
            Staleness::Stale => DropReason::Stale,
            Staleness::Future => DropReason::Future,
        }
    }
}

/// Date, freshness and trust checks for one run. Dedup is left to the caller
/// since it needs the run's mutable seen-set.
#[derive(Debug, Clone, Copy)]
pub struct Screen<'a> {
    pub now: DateTime<Utc>,
    pub freshness: &'a FreshnessWindow,
    pub trust: &'a TrustPolicy,
}

impl Screen<'_> {
    pub fn admit(&self, feed_name: &str, entry: RawEntry) -> Result<NormalizedItem, DropReason> {
        let published_at = dates::resolve_published(&entry).ok_or(DropReason::Undated)?;
        self.freshness.check(published_at, self.now)?;

        let candidate = TrustCandidate {
            link: entry.link_or_empty(),
            title: entry.title.as_deref().unwrap_or_default(),
            source_name: entry.source_title.as_deref().unwrap_or_default(),
        };
        if !self.trust.is_trusted(&candidate) {
            return Err(DropReason::Untrusted);
        }

        Ok(NormalizedItem {
            published_at,
            source_name: feed_name.to_string(),
            identifier: entry.identifier(),
            raw: entry,
        })
    }
}
