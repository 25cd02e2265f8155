//! One pipeline run from the command line, for cron jobs outside the web service.
//!
//! ```bash
//! TELEGRAM_BOT_TOKEN=... TELEGRAM_CHAT_ID=... cargo run --bin watch_once
//! ```

use anyhow::Context;
use news_watcher::{init_tracing, Settings, Watcher, WatcherProfile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env();
    let profile = WatcherProfile::load_default(settings.profile_path.as_deref())
        .context("loading watcher profile")?;
    let watcher = Watcher::from_config(&profile, &settings)?;

    let report = watcher.run_at(chrono::Utc::now()).await;
    println!(
        "delivered={} fetched={} feed_errors={} notify_errors={}",
        report.delivered, report.fetched, report.feed_errors, report.notify_errors
    );
    Ok(())
}
