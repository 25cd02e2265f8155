//! News watcher: Shuttle entrypoint.
//! Loads settings and the watcher profile, then serves the trigger API.
//!
//! See `README.md` for the endpoints and configuration variables.

use std::sync::Arc;

use anyhow::Context;
use news_watcher::metrics::Metrics;
use news_watcher::{api, init_tracing, AppState, Settings, Watcher, WatcherProfile};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    tracing::info!(?settings, "settings loaded");

    let profile = WatcherProfile::load_default(settings.profile_path.as_deref())
        .context("loading watcher profile")?;
    tracing::info!(
        feeds = profile.feeds.len(),
        trust_mode = profile.trust.mode(),
        "watcher profile loaded"
    );

    // recorder first, so the series descriptions reach it
    let metrics = Metrics::init()
        .map_err(|e| tracing::warn!("metrics exporter disabled: {e}"))
        .ok();

    let watcher = Arc::new(Watcher::from_config(&profile, &settings).context("building watcher")?);
    let mut router = api::router(AppState::new(watcher, &settings.cron_token));
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
