// src/state/dedup.rs
//! Persisted set of delivered item identifiers.
//!
//! On disk: one identifier per line, oldest first. In memory the insertion
//! order is kept next to the lookup set, so trimming to `cap` always evicts
//! the oldest identifiers.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::StoreError;

pub const DEFAULT_DEDUP_CAP: usize = 50_000;
pub const DEFAULT_SEEN_FILE: &str = "seen_ids.txt";

/// Insertion-ordered identifier set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    order: VecDeque<String>,
    index: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Returns `false` when the id was already present; its position is unchanged.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push_back(id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// The newest `cap` identifiers, oldest first.
    pub fn newest(&self, cap: usize) -> impl Iterator<Item = &str> {
        self.iter().skip(self.len().saturating_sub(cap))
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = SeenSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
    cap: usize,
}

impl DedupStore {
    /// `cap` below 1 is treated as 1.
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// A missing file is an empty set; any other read failure is an error
    /// the caller may choose to ignore.
    pub async fn load(&self) -> Result<SeenSet, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => Ok(s
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SeenSet::new()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Write the newest `cap` identifiers. The file is replaced via a
    /// temporary sibling so readers never see a half-written set.
    pub async fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        let mut body = String::new();
        for id in seen.newest(self.cap) {
            body.push_str(id);
            body.push('\n');
        }
        write_replacing(&self.path, body.as_bytes()).await
    }
}

pub(crate) async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}
