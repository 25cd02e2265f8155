// tests/pipeline_heartbeat.rs
//
// "No news" heartbeat behaviour across runs with nothing new to deliver.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use news_watcher::state::heartbeat::DEFAULT_HEARTBEAT_FILE;
use news_watcher::state::HeartbeatDecision;

const EMPTY_FEED: &str = r#"<rss version="2.0"><channel><title>quiet</title></channel></rss>"#;

#[tokio::test]
async fn one_heartbeat_per_local_hour() {
    let tmp = tempfile::tempdir().unwrap();
    let p = profile(&[("KAP", RSS_URL)]);
    let (w, sent) = watcher(&p, tmp.path(), &[(RSS_URL, EMPTY_FEED)]);

    let first = w.run_at(monday_morning()).await;
    assert_eq!(
        first.heartbeat,
        Some(HeartbeatDecision::Send {
            tag: "2025-09-08 12".into()
        })
    );

    let again = w.run_at(monday_morning() + Duration::minutes(40)).await;
    assert!(matches!(
        again.heartbeat,
        Some(HeartbeatDecision::AlreadySent { .. })
    ));
    assert_eq!(sent.messages().len(), 1);

    let next_hour = w.run_at(monday_morning() + Duration::minutes(65)).await;
    assert!(matches!(
        next_hour.heartbeat,
        Some(HeartbeatDecision::Send { .. })
    ));

    let msgs = sent.messages();
    assert_eq!(msgs.len(), 2);
    assert_eq!(
        msgs[0],
        "🟡 Today (2025-09-08) there are no new items on the watch list."
    );
    let tag = std::fs::read_to_string(tmp.path().join(DEFAULT_HEARTBEAT_FILE)).unwrap();
    assert_eq!(tag, "2025-09-08 13");
}

#[tokio::test]
async fn weekend_and_off_hours_stay_silent() {
    let tmp = tempfile::tempdir().unwrap();
    let p = profile(&[("KAP", RSS_URL)]);
    let (w, sent) = watcher(&p, tmp.path(), &[(RSS_URL, EMPTY_FEED)]);

    // Saturday noon local
    let saturday = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
    // Monday 06:00 and 19:00 local
    let early = Utc.with_ymd_and_hms(2025, 9, 8, 3, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2025, 9, 8, 16, 0, 0).unwrap();

    for now in [saturday, early, late] {
        let report = w.run_at(now).await;
        assert_eq!(report.heartbeat, Some(HeartbeatDecision::OutsideSchedule));
    }
    assert!(sent.messages().is_empty());
    assert!(!tmp.path().join(DEFAULT_HEARTBEAT_FILE).exists());
}

#[tokio::test]
async fn bucket_follows_the_configured_offset() {
    let tmp = tempfile::tempdir().unwrap();
    let mut p = profile(&[("KAP", RSS_URL)]);
    p.schedule.end_hour = 23;
    let (w, sent) = watcher(&p, tmp.path(), &[(RSS_URL, EMPTY_FEED)]);

    // 20:30 UTC Monday is 23:30 local: inside an 8..=23 window
    let report = w.run_at(Utc.with_ymd_and_hms(2025, 9, 8, 20, 30, 0).unwrap()).await;
    assert_eq!(
        report.heartbeat,
        Some(HeartbeatDecision::Send {
            tag: "2025-09-08 23".into()
        })
    );
    assert_eq!(sent.messages().len(), 1);
}

#[tokio::test]
async fn dropped_entries_still_count_as_no_news() {
    let tmp = tempfile::tempdir().unwrap();
    let p = profile(&[("KAP", RSS_URL)]);
    let doc = rss(&[(
        "spam-1",
        "https://spam.test/gold",
        "Gold to the moon",
        &monday_morning().to_rfc2822(),
    )]);
    let (w, sent) = watcher(&p, tmp.path(), &[(RSS_URL, doc.as_str())]);

    let report = w.run_at(monday_morning()).await;
    assert_eq!(report.delivered, 0);
    assert_eq!(sent.messages().len(), 1);
    assert!(sent.messages()[0].starts_with("🟡"));
}
