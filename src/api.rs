use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;

use crate::ingest::Watcher;

#[derive(Clone)]
pub struct AppState {
    watcher: Arc<Watcher>,
    // sha256 of the shared secret; `None` leaves /cron open
    cron_token_digest: Option<[u8; 32]>,
}

impl AppState {
    pub fn new(watcher: Arc<Watcher>, cron_token: &str) -> Self {
        let token = cron_token.trim();
        Self {
            watcher,
            cron_token_digest: (!token.is_empty()).then(|| digest(token)),
        }
    }

    // digests have fixed length, so the comparison does not leak the token length
    fn authorized(&self, presented: &str) -> bool {
        match &self.cron_token_digest {
            None => true,
            Some(expected) => digest(presented) == *expected,
        }
    }
}

fn digest(s: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(s.as_bytes()));
    out
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Alive" }))
        .route("/health", get(|| async { "ok" }))
        .route("/cron", get(cron))
        .route("/test", get(test_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct CronQuery {
    #[serde(default)]
    token: String,
}

async fn cron(State(state): State<AppState>, Query(q): Query<CronQuery>) -> (StatusCode, Json<Value>) {
    if !state.authorized(&q.token) {
        tracing::warn!("rejected /cron call with a wrong token");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "ok": false, "error": "unauthorized" })),
        );
    }
    let n = state.watcher.clone().run_guarded().await;
    (StatusCode::OK, Json(json!({ "ok": true, "new_items": n })))
}

async fn test_notification(State(state): State<AppState>) -> &'static str {
    if let Err(e) = state.watcher.send_test().await {
        tracing::warn!("test notification failed: {e}");
    }
    "ok"
}
