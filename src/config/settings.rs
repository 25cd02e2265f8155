// src/config/settings.rs
use std::fmt;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_CRON_TOKEN: &str = "CRON_TOKEN";
pub const ENV_TZ_OFFSET: &str = "TZ_OFFSET_HOURS";
pub const ENV_CONFIG_PATH: &str = "WATCHER_CONFIG_PATH";
pub const ENV_STATE_DIR: &str = "WATCHER_STATE_DIR";

pub const DEFAULT_TZ_OFFSET_HOURS: i32 = 3;

/// Secrets and deployment knobs read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    /// Empty means the trigger endpoint is open.
    pub cron_token: String,
    pub tz_offset_hours: i32,
    pub state_dir: PathBuf,
    pub profile_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            cron_token: String::new(),
            tz_offset_hours: DEFAULT_TZ_OFFSET_HOURS,
            state_dir: PathBuf::from("."),
            profile_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let trimmed = |k: &str| get(k).map(|v| v.trim().to_string()).unwrap_or_default();

        Self {
            telegram_bot_token: trimmed(ENV_BOT_TOKEN),
            telegram_chat_id: trimmed(ENV_CHAT_ID),
            cron_token: trimmed(ENV_CRON_TOKEN),
            tz_offset_hours: parse_tz_offset(get(ENV_TZ_OFFSET)),
            state_dir: Some(trimmed(ENV_STATE_DIR))
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            profile_path: Some(trimmed(ENV_CONFIG_PATH))
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn tz_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn trigger_is_open(&self) -> bool {
        self.cron_token.is_empty()
    }
}

// parse optional hour offset; anything unusable falls back to the default
fn parse_tz_offset(raw: Option<String>) -> i32 {
    let Some(raw) = raw else {
        return DEFAULT_TZ_OFFSET_HOURS;
    };
    match raw.trim().parse::<i32>() {
        Ok(h) if (-23..=23).contains(&h) => h,
        _ => {
            tracing::warn!("{ENV_TZ_OFFSET}={raw:?} is not an hour offset in -23..=23; using {DEFAULT_TZ_OFFSET_HOURS}");
            DEFAULT_TZ_OFFSET_HOURS
        }
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("cron_token", &redact(&self.cron_token))
            .field("tz_offset_hours", &self.tz_offset_hours)
            .field("state_dir", &self.state_dir)
            .field("profile_path", &self.profile_path)
            .finish()
    }
}
