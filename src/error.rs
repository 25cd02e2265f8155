// src/error.rs
//! Typed failures for each collaborator the watcher talks to.
//!
//! The pipeline decides per kind whether to fail open (fetch, dedup load)
//! or simply log and move on (persist, notify).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("xml error: {0}")]
    Xml(String),
    #[error("document is neither an RSS channel nor an Atom feed")]
    NotAFeed,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed host answered with status {0}")]
    Status(u16),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("messaging api rejected the message ({status}): {body}")]
    Api { status: u16, body: String },
}
