// src/notify/mod.rs
pub mod telegram;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::ingest::normalize_text;
use crate::ingest::types::NormalizedItem;

pub use telegram::TelegramNotifier;

/// Outbound channel for formatted (HTML subset) messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
    fn name(&self) -> &'static str;
}

/// Message texts; `{date}` in `heartbeat_text` is replaced with the local date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub item_prefix: String,
    pub heartbeat_prefix: String,
    pub heartbeat_text: String,
    pub test_text: String,
    pub missing_title: String,
    pub missing_link: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            item_prefix: "📰".to_string(),
            heartbeat_prefix: "🟡".to_string(),
            heartbeat_text: "Today ({date}) there are no new items on the watch list.".to_string(),
            test_text: "🧪 System test successful.".to_string(),
            missing_title: "Untitled".to_string(),
            missing_link: "#".to_string(),
        }
    }
}

impl MessageTemplates {
    /// `{prefix} <b>{feed}</b>\n{title}\n{link}`, escaped for HTML parse mode.
    pub fn format_item(&self, item: &NormalizedItem) -> String {
        let title = item
            .raw
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.missing_title.clone());
        let link = item
            .raw
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.missing_link);
        format!(
            "{} <b>{}</b>\n{}\n{}",
            self.item_prefix,
            html_escape::encode_text(&item.source_name),
            html_escape::encode_text(&title),
            html_escape::encode_text(link)
        )
    }

    pub fn format_heartbeat(&self, local: &DateTime<FixedOffset>) -> String {
        let date = local.date_naive().to_string();
        format!(
            "{} {}",
            self.heartbeat_prefix,
            self.heartbeat_text.replace("{date}", &date)
        )
    }
}

/// Keeps every message in memory instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self.sent.lock() {
            Ok(mut v) => v.push(text.to_string()),
            Err(p) => p.into_inner().push(text.to_string()),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
