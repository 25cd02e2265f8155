// tests/api_http.rs
//
// HTTP-level tests for the trigger router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /  and  GET /health
// - GET /cron  (token check, JSON body, delivered count)
// - GET /test

mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use chrono::{Duration, Utc};
use common::*;
use http::{Request, StatusCode};
use news_watcher::notify::RecordingNotifier;
use news_watcher::{api, AppState};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

const BODY_LIMIT: usize = 64 * 1024;

fn test_router(dir: &std::path::Path, token: &str) -> (Router, Arc<RecordingNotifier>) {
    // dated relative to the wall clock: /cron runs with Utc::now()
    let fresh = (Utc::now() - Duration::hours(1)).to_rfc2822();
    let doc = rss(&[("bht-live", "https://www.bloomberght.com/live", "Gold up", &fresh)]);
    let p = profile(&[("Gümüş Analiz", RSS_URL)]);
    let (w, sent) = watcher(&p, dir, &[(RSS_URL, doc.as_str())]);
    (api::router(AppState::new(Arc::new(w), token)), sent)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn liveness_routes_answer_plain_text() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _) = test_router(tmp.path(), "s3cret");

    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Alive");

    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn cron_rejects_wrong_or_missing_token_without_running() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, sent) = test_router(tmp.path(), "s3cret");

    for uri in ["/cron", "/cron?token=nope", "/cron?token=s3cret2"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        let v: Json = serde_json::from_str(&body).expect("json body");
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"], "unauthorized");
    }
    assert!(sent.messages().is_empty());
    assert!(!tmp.path().join("seen_ids.txt").exists());
}

#[tokio::test]
async fn cron_with_token_runs_once_and_reports_count() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, sent) = test_router(tmp.path(), "s3cret");

    let (status, body) = get(app.clone(), "/cron?token=s3cret").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json body");
    assert_eq!(v["ok"], true);
    assert_eq!(v["new_items"], 1);
    assert!(sent.messages()[0].contains("Gold up"));

    // second trigger sees the persisted id
    let (_, body) = get(app, "/cron?token=s3cret").await;
    let v: Json = serde_json::from_str(&body).expect("json body");
    assert_eq!(v["new_items"], 0);
}

#[tokio::test]
async fn empty_token_leaves_cron_open() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, _) = test_router(tmp.path(), "  ");

    let (status, body) = get(app, "/cron").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json body");
    assert_eq!(v["new_items"], 1);
}

#[tokio::test]
async fn test_route_sends_the_test_message() {
    let tmp = tempfile::tempdir().unwrap();
    let (app, sent) = test_router(tmp.path(), "s3cret");

    let (status, body) = get(app, "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(sent.messages(), ["🧪 System test successful."]);
}
