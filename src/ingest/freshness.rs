// src/ingest/freshness.rs
use chrono::{DateTime, Duration, Utc};

/// Rolling recency window evaluated against a `now` captured once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    max_age: Duration,
    future_tolerance: Duration,
}

/// Why an entry fell outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Stale,
    Future,
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::new(36, 24)
    }
}

impl FreshnessWindow {
    /// Negative inputs are treated as 0.
    pub fn new(max_age_hours: i64, future_tolerance_hours: i64) -> Self {
        Self {
            max_age: Duration::hours(max_age_hours.max(0)),
            future_tolerance: Duration::hours(future_tolerance_hours.max(0)),
        }
    }

    /// `now - published_at <= max_age` is accepted (inclusive boundary);
    /// entries more than `future_tolerance` ahead of `now` are rejected.
    pub fn check(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), Staleness> {
        let age = now.signed_duration_since(published_at);
        if -age > self.future_tolerance {
            return Err(Staleness::Future);
        }
        if age > self.max_age {
            return Err(Staleness::Stale);
        }
        Ok(())
    }

    pub fn is_fresh(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.check(published_at, now).is_ok()
    }
}
