// src/ingest/types.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// A named feed URL from the watcher profile.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String, // display name used in notifications
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One syndicated entry as produced by the feed parser.
///
/// `published` / `updated` hold timestamps the parser could read from a
/// standard format. Every text field of the entry is also kept verbatim in
/// `fields`, keyed by element name (`pubDate`, `published`, `updated`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub source_title: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, String>,
}

impl RawEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Dedup identifier: native id, else link, else title, else "".
    /// Pure function of the entry so it is stable across restarts.
    pub fn identifier(&self) -> String {
        [&self.id, &self.link, &self.title]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    pub fn link_or_empty(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }
}

/// Entry that passed date, freshness and trust checks during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub identifier: String,
    pub raw: RawEntry,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetch and parse one feed. A failure means the source contributes
    /// nothing to this run.
    async fn fetch_entries(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError>;
}
