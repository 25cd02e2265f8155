// src/ingest/pipeline.rs
//! One watcher run: fetch → screen → dedup → persist → notify → heartbeat.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::{counter, gauge};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Settings, WatcherProfile};
use crate::error::NotifyError;
use crate::ingest::freshness::FreshnessWindow;
use crate::ingest::providers::HttpFeedProvider;
use crate::ingest::trust::TrustPolicy;
use crate::ingest::types::{FeedProvider, FeedSource, NormalizedItem};
use crate::ingest::{ensure_metrics_described, DropReason, Screen};
use crate::notify::{MessageTemplates, Notifier, TelegramNotifier};
use crate::state::dedup::DEFAULT_SEEN_FILE;
use crate::state::heartbeat::DEFAULT_HEARTBEAT_FILE;
use crate::state::{DedupStore, HeartbeatDecision, HeartbeatGate, SeenSet};

/// What happened during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub delivered: usize,
    pub fetched: usize,
    pub feed_errors: usize,
    pub notify_errors: usize,
    pub dropped: HashMap<DropReason, usize>,
    /// `None` when the run had new items and the gate was not consulted.
    pub heartbeat: Option<HeartbeatDecision>,
}

impl RunReport {
    pub fn dropped(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }
}

/// The configured pipeline. Collaborators are injected at construction;
/// there is no process-wide state.
pub struct Watcher {
    feeds: Vec<FeedSource>,
    provider: Arc<dyn FeedProvider>,
    notifier: Arc<dyn Notifier>,
    dedup: DedupStore,
    heartbeat: HeartbeatGate,
    trust: TrustPolicy,
    freshness: FreshnessWindow,
    messages: MessageTemplates,
    tz: FixedOffset,
    // single-flight per process; two processes sharing state files still race
    run_lock: Mutex<()>,
}

impl Watcher {
    /// Production wiring: HTTP feeds + Telegram, state files under `settings.state_dir`.
    pub fn from_config(profile: &WatcherProfile, settings: &Settings) -> anyhow::Result<Self> {
        let provider = HttpFeedProvider::new(&profile.user_agent, profile.fetch_timeout())?;
        let notifier = TelegramNotifier::new(&settings.telegram_bot_token, &settings.telegram_chat_id)
            .with_timeout(profile.notify_timeout_secs);
        if !notifier.is_enabled() {
            warn!("Telegram credentials missing; notifications are disabled");
        }
        Ok(Self::with_collaborators(
            profile,
            &settings.state_dir,
            settings.tz_offset(),
            Arc::new(provider),
            Arc::new(notifier),
        ))
    }

    pub fn with_collaborators(
        profile: &WatcherProfile,
        state_dir: &Path,
        tz: FixedOffset,
        provider: Arc<dyn FeedProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            feeds: profile.feeds.clone(),
            provider,
            notifier,
            dedup: DedupStore::new(state_dir.join(DEFAULT_SEEN_FILE), profile.dedup_cap),
            heartbeat: HeartbeatGate::new(state_dir.join(DEFAULT_HEARTBEAT_FILE), profile.schedule),
            trust: profile.trust.clone().normalized(),
            freshness: FreshnessWindow::new(profile.freshness_hours, profile.future_tolerance_hours),
            messages: profile.messages.clone(),
            tz,
            run_lock: Mutex::new(()),
        }
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub fn dedup_store(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn heartbeat_gate(&self) -> &HeartbeatGate {
        &self.heartbeat
    }

    /// Run against the wall clock; returns the delivered count.
    pub async fn run_once(&self) -> usize {
        self.run_at(Utc::now()).await.delivered
    }

    /// Run detached so that even a panic inside a collaborator degrades to
    /// "0 new items" instead of taking the caller down.
    pub async fn run_guarded(self: Arc<Self>) -> usize {
        match tokio::spawn(async move { self.run_once().await }).await {
            Ok(n) => n,
            Err(e) => {
                warn!(target: "watch", "pipeline run aborted: {e}");
                0
            }
        }
    }

    /// One pipeline run with `now` captured once for every freshness check.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let _guard = self.run_lock.lock().await;
        let mut report = RunReport::default();

        let mut seen = match self.dedup.load().await {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "watch", "dedup load failed, starting empty: {e}");
                counter!("watch_store_errors_total").increment(1);
                SeenSet::new()
            }
        };

        let new_items = self.collect_new(now, &mut seen, &mut report).await;

        if let Err(e) = self.dedup.persist(&seen).await {
            warn!(target: "watch", "dedup persist failed: {e}");
            counter!("watch_store_errors_total").increment(1);
        }

        for item in &new_items {
            let text = self.messages.format_item(item);
            match self.notifier.send(&text).await {
                Ok(()) => counter!("watch_delivered_total").increment(1),
                Err(e) => {
                    report.notify_errors += 1;
                    warn!(target: "watch", notifier = self.notifier.name(), id = %item.identifier, "send failed: {e}");
                    counter!("watch_notify_errors_total").increment(1);
                }
            }
        }
        report.delivered = new_items.len();

        if new_items.is_empty() {
            let local = now.with_timezone(&self.tz);
            report.heartbeat = Some(self.maybe_heartbeat(&local).await);
        }

        gauge!("watch_last_run_ts").set(now.timestamp() as f64);
        info!(
            target: "watch",
            delivered = report.delivered,
            fetched = report.fetched,
            feed_errors = report.feed_errors,
            dedup_size = seen.len(),
            "run finished"
        );
        report
    }

    /// Fetch all feeds in order and return unseen items sorted oldest first.
    /// Every admitted id is marked in `seen` immediately, so a story carried
    /// by two feeds in the same run is only kept once.
    async fn collect_new(
        &self,
        now: DateTime<Utc>,
        seen: &mut SeenSet,
        report: &mut RunReport,
    ) -> Vec<NormalizedItem> {
        let screen = Screen {
            now,
            freshness: &self.freshness,
            trust: &self.trust,
        };
        let mut new_items = Vec::new();

        for feed in &self.feeds {
            let entries = match self.provider.fetch_entries(feed).await {
                Ok(v) => v,
                Err(e) => {
                    report.feed_errors += 1;
                    warn!(target: "watch", feed = %feed.name, "feed skipped: {e}");
                    counter!("watch_feed_errors_total").increment(1);
                    continue;
                }
            };
            report.fetched += entries.len();

            for entry in entries {
                let admitted = screen
                    .admit(&feed.name, entry)
                    .and_then(|item| {
                        if seen.insert(item.identifier.as_str()) {
                            Ok(item)
                        } else {
                            Err(DropReason::Duplicate)
                        }
                    });
                match admitted {
                    Ok(item) => new_items.push(item),
                    Err(reason) => {
                        debug!(target: "watch", feed = %feed.name, reason = reason.as_str(), "entry dropped");
                        counter!("watch_dropped_total", "reason" => reason.as_str()).increment(1);
                        *report.dropped.entry(reason).or_default() += 1;
                    }
                }
            }
        }

        // stable: equal timestamps keep feed order
        new_items.sort_by_key(|it| it.published_at);
        new_items
    }

    async fn maybe_heartbeat(&self, local: &DateTime<FixedOffset>) -> HeartbeatDecision {
        let decision = self.heartbeat.should_send(local).await;
        if let HeartbeatDecision::Send { tag } = &decision {
            let text = self.messages.format_heartbeat(local);
            match self.notifier.send(&text).await {
                Ok(()) => counter!("watch_heartbeats_total").increment(1),
                Err(e) => {
                    warn!(target: "watch", "heartbeat send failed: {e}");
                    counter!("watch_notify_errors_total").increment(1);
                }
            }
            // recorded even after a failed send: at most one attempt per hour
            if let Err(e) = self.heartbeat.record_sent(tag).await {
                warn!(target: "watch", "heartbeat tag persist failed: {e}");
                counter!("watch_store_errors_total").increment(1);
            }
        } else {
            debug!(target: "watch", ?decision, "heartbeat suppressed");
        }
        decision
    }

    /// Manual connectivity check for the messaging channel.
    pub async fn send_test(&self) -> Result<(), NotifyError> {
        self.notifier.send(&self.messages.test_text).await
    }
}
