// src/notify/telegram.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::Notifier;
use crate::error::NotifyError;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

/// Telegram Bot API `sendMessage` with HTML parse mode.
/// Without credentials every send is a logged no-op.
#[derive(Clone)]
pub struct TelegramNotifier {
    creds: Option<Credentials>,
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    /// Blank token or chat id disables delivery.
    pub fn new(bot_token: &str, chat_id: &str) -> Self {
        let (token, chat) = (bot_token.trim(), chat_id.trim());
        let creds = (!token.is_empty() && !chat.is_empty()).then(|| Credentials {
            bot_token: token.to_string(),
            chat_id: chat.to_string(),
        });
        Self {
            creds,
            client: Client::new(),
            api_base: API_BASE.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn disabled() -> Self {
        Self::new("", "")
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Point at a different API host (self-hosted Bot API server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.creds.is_some()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let Some(creds) = &self.creds else {
            tracing::debug!("Telegram disabled (no TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID)");
            return Ok(());
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, creds.bot_token);
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&json!({
                "chat_id": creds.chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
