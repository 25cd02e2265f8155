// src/config/profile.rs
//! Watcher profile: which feeds to poll, which publishers to trust, when the
//! heartbeat is active and how messages look. Loaded from TOML or JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::providers::http_feed::DEFAULT_USER_AGENT;
use crate::ingest::trust::TrustPolicy;
use crate::ingest::types::FeedSource;
use crate::notify::MessageTemplates;
use crate::state::dedup::DEFAULT_DEDUP_CAP;
use crate::state::ActiveSchedule;

pub const DEFAULT_PROFILE_TOML: &str = "config/watcher.toml";
pub const DEFAULT_PROFILE_JSON: &str = "config/watcher.json";

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    20
}
fn default_notify_timeout_secs() -> u64 {
    15
}
fn default_dedup_cap() -> usize {
    DEFAULT_DEDUP_CAP
}
fn default_freshness_hours() -> i64 {
    36
}
fn default_future_tolerance_hours() -> i64 {
    24
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherProfile {
    pub feeds: Vec<FeedSource>,
    pub trust: TrustPolicy,
    #[serde(default)]
    pub schedule: ActiveSchedule,
    #[serde(default)]
    pub messages: MessageTemplates,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
    #[serde(default = "default_dedup_cap")]
    pub dedup_cap: usize,
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: i64,
    #[serde(default = "default_future_tolerance_hours")]
    pub future_tolerance_hours: i64,
}

fn google_news(query: &str) -> String {
    format!("https://news.google.com/rss/search?q={query}&hl=tr&gl=TR&ceid=TR:tr")
}

impl WatcherProfile {
    /// Built-in profile: Tera group and gold/silver searches on Google News,
    /// hostname allow-list of Turkish financial outlets.
    pub fn builtin() -> Self {
        let feeds = [
            ("Tera Yatırım", "Tera+Yatırım"),
            ("Tera Yatirim", "Tera+Yatirim"),
            ("TEHOL", "TEHOL"),
            ("TRHOL", "TRHOL"),
            ("TLY", "TLY"),
            ("FSU", "FSU"),
            ("Gümüş Analiz", "Gümüş+yorum+analiz"),
            ("Gümüş Piyasası", "Gümüş+ons+gram+haberleri"),
        ]
        .into_iter()
        .map(|(name, q)| FeedSource::new(name, google_news(q)))
        .collect();

        let trusted = [
            "kap.org.tr",
            "borsagundem.com",
            "bloomberght.com",
            "investing.com",
            "mynet.com",
            "bigpara.com",
            "terayatirim.com",
            "terayatirim.com.tr",
            "x.com",
            "twitter.com",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            feeds,
            trust: TrustPolicy::Hostname(trusted),
            schedule: ActiveSchedule::default(),
            messages: MessageTemplates::default(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            notify_timeout_secs: default_notify_timeout_secs(),
            dedup_cap: default_dedup_cap(),
            freshness_hours: default_freshness_hours(),
            future_tolerance_hours: default_future_tolerance_hours(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Normalize trust entries and reject unusable settings.
    pub fn validated(mut self) -> Result<Self> {
        self.trust = self.trust.normalized();
        self.feeds.retain(|f| !f.url.trim().is_empty());
        if self.feeds.is_empty() {
            bail!("profile has no feeds");
        }
        if self.trust.entries().is_empty() {
            bail!("trust policy '{}' has no entries", self.trust.mode());
        }
        self.schedule.validate()?;
        if self.dedup_cap == 0 {
            bail!("dedup_cap must be at least 1");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be at least 1");
        }
        Ok(self)
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading watcher profile from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_profile(&content, ext.as_str())
            .with_context(|| format!("parsing watcher profile {}", path.display()))?
            .validated()
    }

    /// Load using the configured path + fallbacks:
    /// 1) explicit path (from `WATCHER_CONFIG_PATH`), which must exist
    /// 2) config/watcher.toml
    /// 3) config/watcher.json
    /// 4) [`WatcherProfile::builtin`]
    pub fn load_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            if p.exists() {
                return Self::load_from(p);
            }
            return Err(anyhow!(
                "WATCHER_CONFIG_PATH points to non-existent path {}",
                p.display()
            ));
        }
        for candidate in [DEFAULT_PROFILE_TOML, DEFAULT_PROFILE_JSON] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        tracing::info!("no watcher profile file found; using built-in profile");
        Self::builtin().validated()
    }
}

fn parse_profile(s: &str, hint_ext: &str) -> Result<WatcherProfile> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str(s) {
        Ok(p) => Ok(p),
        Err(toml_err) => serde_json::from_str(s).map_err(|_| anyhow!(toml_err)),
    }
}
