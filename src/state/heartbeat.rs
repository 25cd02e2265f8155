// src/state/heartbeat.rs
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::StoreError;
use crate::state::dedup::write_replacing;

pub const DEFAULT_HEARTBEAT_FILE: &str = "last_no_news_tag.txt";

/// Weekday hour range (inclusive on both ends) in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSchedule {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for ActiveSchedule {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
        }
    }
}

impl ActiveSchedule {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.end_hour > 23 || self.start_hour > self.end_hour {
            anyhow::bail!(
                "invalid schedule window [{}, {}]: need start <= end <= 23",
                self.start_hour,
                self.end_hour
            );
        }
        Ok(())
    }

    pub fn is_active(&self, local: &DateTime<FixedOffset>) -> bool {
        let weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        !weekend && (self.start_hour..=self.end_hour).contains(&local.hour())
    }
}

/// `YYYY-MM-DD HH` bucket of a local time.
pub fn hour_tag(local: &DateTime<FixedOffset>) -> String {
    local.format("%Y-%m-%d %H").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatDecision {
    /// Weekend or outside the active hours.
    OutsideSchedule,
    /// A heartbeat already went out for this hour bucket.
    AlreadySent { tag: String },
    Send { tag: String },
}

/// At most one "no news" heartbeat per local hour bucket.
///
/// The last sent tag is persisted in a one-line file. There is no locking:
/// two processes sharing the file can both send for the same hour.
#[derive(Debug, Clone)]
pub struct HeartbeatGate {
    path: PathBuf,
    schedule: ActiveSchedule,
}

impl HeartbeatGate {
    pub fn new(path: impl Into<PathBuf>, schedule: ActiveSchedule) -> Self {
        Self {
            path: path.into(),
            schedule,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schedule(&self) -> ActiveSchedule {
        self.schedule
    }

    /// Last tag written, `None` when absent, blank or unreadable.
    pub async fn last_tag(&self) -> Option<String> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => Some(s.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(target: "watch", path = %self.path.display(), "heartbeat tag read: {e}");
                None
            }
        }
    }

    /// Does not mutate state; call [`record_sent`](Self::record_sent) after sending.
    pub async fn should_send(&self, local: &DateTime<FixedOffset>) -> HeartbeatDecision {
        if !self.schedule.is_active(local) {
            return HeartbeatDecision::OutsideSchedule;
        }
        let tag = hour_tag(local);
        if self.last_tag().await.as_deref() == Some(tag.as_str()) {
            return HeartbeatDecision::AlreadySent { tag };
        }
        HeartbeatDecision::Send { tag }
    }

    pub async fn record_sent(&self, tag: &str) -> Result<(), StoreError> {
        write_replacing(&self.path, tag.as_bytes()).await
    }
}
