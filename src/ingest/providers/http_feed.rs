// src/ingest/providers/http_feed.rs
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::error::FetchError;
use crate::ingest::parse::parse_feed;
use crate::ingest::types::{FeedProvider, FeedSource, RawEntry};

/// Browser-like agent; some feed hosts throttle obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct HttpFeedProvider {
    mode: Mode,
}

enum Mode {
    // url -> document; used by tests and offline runs
    Fixture(HashMap<String, String>),
    Http { client: reqwest::Client },
}

impl HttpFeedProvider {
    /// HTTP provider; every request carries `user_agent` and is bounded by `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            mode: Mode::Http { client },
        })
    }

    pub fn from_fixtures<I, U, B>(docs: I) -> Self
    where
        I: IntoIterator<Item = (U, B)>,
        U: Into<String>,
        B: Into<String>,
    {
        Self {
            mode: Mode::Fixture(
                docs.into_iter()
                    .map(|(u, b)| (u.into(), b.into()))
                    .collect(),
            ),
        }
    }

    fn parse_body(source: &FeedSource, body: &str) -> Result<Vec<RawEntry>, FetchError> {
        let t0 = std::time::Instant::now();
        let entries = parse_feed(body)?;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("watch_parse_ms").record(ms);
        counter!("watch_entries_total").increment(entries.len() as u64);
        tracing::debug!(
            target: "watch",
            feed = %source.name,
            entries = entries.len(),
            "feed parsed"
        );
        Ok(entries)
    }
}

#[async_trait]
impl FeedProvider for HttpFeedProvider {
    async fn fetch_entries(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        match &self.mode {
            Mode::Fixture(docs) => match docs.get(&source.url) {
                Some(body) => Self::parse_body(source, body),
                None => Err(FetchError::Status(404)),
            },
            Mode::Http { client } => {
                let t0 = std::time::Instant::now();
                let resp = client.get(&source.url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                let body = resp.text().await?;
                histogram!("watch_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                Self::parse_body(source, &body)
            }
        }
    }
}
