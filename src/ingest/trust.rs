// src/ingest/trust.rs
//! Publisher trust policies.
//!
//! All three policies are deliberately permissive string heuristics: links
//! from aggregators (Google News redirectors and the like) often carry the
//! real publisher somewhere other than the host, so false positives are
//! accepted in exchange for not losing those items.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// What the trust check looks at for one entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustCandidate<'a> {
    pub link: &'a str,
    pub title: &'a str,
    pub source_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "entries", rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Link host equals an entry or is a subdomain of it.
    Hostname(Vec<String>),
    /// Any entry appears in `link + title + source_name` (lower-cased).
    Keyword(Vec<String>),
    /// Any entry appears in the lower-cased link or source name.
    DomainSubstring(Vec<String>),
}

impl TrustPolicy {
    pub fn mode(&self) -> &'static str {
        match self {
            TrustPolicy::Hostname(_) => "hostname",
            TrustPolicy::Keyword(_) => "keyword",
            TrustPolicy::DomainSubstring(_) => "domain_substring",
        }
    }

    pub fn entries(&self) -> &[String] {
        match self {
            TrustPolicy::Hostname(v) | TrustPolicy::Keyword(v) | TrustPolicy::DomainSubstring(v) => v,
        }
    }

    /// Trim, lower-case and drop blank entries.
    pub fn normalized(self) -> Self {
        fn clean(v: Vec<String>) -> Vec<String> {
            v.into_iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        }
        match self {
            TrustPolicy::Hostname(v) => TrustPolicy::Hostname(clean(v)),
            TrustPolicy::Keyword(v) => TrustPolicy::Keyword(clean(v)),
            TrustPolicy::DomainSubstring(v) => TrustPolicy::DomainSubstring(clean(v)),
        }
    }

    pub fn is_trusted(&self, c: &TrustCandidate<'_>) -> bool {
        match self {
            TrustPolicy::Hostname(allowed) => match link_host(c.link) {
                Some(host) => allowed.iter().any(|d| host_matches(&host, d)),
                None => false,
            },
            TrustPolicy::Keyword(keywords) => {
                let hay = format!("{}{}{}", c.link, c.title, c.source_name).to_lowercase();
                keywords.iter().any(|k| hay.contains(k.as_str()))
            }
            TrustPolicy::DomainSubstring(domains) => {
                let link = c.link.to_lowercase();
                let source = c.source_name.to_lowercase();
                domains
                    .iter()
                    .any(|d| link.contains(d.as_str()) || source.contains(d.as_str()))
            }
        }
    }
}

fn link_host(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

fn host_matches(host: &str, allowed: &str) -> bool {
    host == allowed
        || host
            .strip_suffix(allowed)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
