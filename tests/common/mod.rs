// tests/common/mod.rs
// Shared wiring for the pipeline tests: fixture feeds, a recording notifier
// and a throwaway state directory.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use news_watcher::config::WatcherProfile;
use news_watcher::ingest::providers::HttpFeedProvider;
use news_watcher::ingest::trust::TrustPolicy;
use news_watcher::ingest::types::FeedSource;
use news_watcher::notify::RecordingNotifier;
use news_watcher::Watcher;

pub const RSS_URL: &str = "https://feeds.test/gold.rss";
pub const ATOM_URL: &str = "https://feeds.test/tera.atom";

pub const GOLD_RSS: &str = include_str!("../fixtures/gold_rss.xml");
pub const GOLD_ATOM: &str = include_str!("../fixtures/gold_atom.xml");

/// Monday 2025-09-08 09:00 UTC, i.e. 12:00 at UTC+3.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 8, 9, 0, 0).unwrap()
}

pub fn tz() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

pub fn profile(feeds: &[(&str, &str)]) -> WatcherProfile {
    let mut p = WatcherProfile::builtin();
    p.feeds = feeds
        .iter()
        .map(|(name, url)| FeedSource::new(*name, *url))
        .collect();
    p.trust = TrustPolicy::Hostname(vec![
        "bloomberght.com".into(),
        "kap.org.tr".into(),
        "terayatirim.com".into(),
    ]);
    p.validated().expect("test profile is valid")
}

pub fn watcher(
    profile: &WatcherProfile,
    state_dir: &Path,
    docs: &[(&str, &str)],
) -> (Watcher, Arc<RecordingNotifier>) {
    let provider = HttpFeedProvider::from_fixtures(docs.iter().copied());
    let notifier = Arc::new(RecordingNotifier::new());
    let w = Watcher::with_collaborators(
        profile,
        state_dir,
        tz(),
        Arc::new(provider),
        notifier.clone(),
    );
    (w, notifier)
}

/// Minimal RSS document with one item per `(guid, link, title, pubDate)`.
pub fn rss(items: &[(&str, &str, &str, &str)]) -> String {
    let mut body = String::from(r#"<rss version="2.0"><channel><title>t</title>"#);
    for (guid, link, title, date) in items {
        body.push_str(&format!(
            "<item><guid>{guid}</guid><link>{link}</link><title>{title}</title><pubDate>{date}</pubDate></item>"
        ));
    }
    body.push_str("</channel></rss>");
    body
}
