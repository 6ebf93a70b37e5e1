//! Usage counters persisted between sessions.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::model::Bookmark;

/// Persisted `bookmark id -> usage count` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStore {
    path: PathBuf,
    counts: BTreeMap<String, u64>,
}

impl UsageStore {
    /// Create an empty store that saves to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            counts: BTreeMap::new(),
        }
    }

    /// Load counts from `path`. A missing or corrupt file starts an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        let data = match fs::read_to_string(&store.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %store.path.display(), "no usage counts yet");
                return Ok(store);
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read usage counts at {}", store.path.display())
                });
            }
        };

        match serde_json::from_str(&data) {
            Ok(counts) => store.counts = counts,
            Err(err) => {
                tracing::error!(path = %store.path.display(), error = %err, "usage counts are corrupt, starting fresh");
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_count(&self, id: &str) -> u64 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Bump the counter for `id` and return the new value.
    pub fn increment(&mut self, id: &str) -> u64 {
        let count = self.counts.entry(id.to_owned()).or_insert(0);
        *count += 1;
        tracing::debug!(id, count = *count, "incremented usage count");
        *count
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        tracing::info!("usage counts cleared");
    }

    /// Copy stored counts onto freshly loaded bookmarks. Bookmarks without a stored count keep
    /// whatever count they were loaded with.
    pub fn apply(&self, bookmarks: &mut [Bookmark]) {
        for bookmark in bookmarks {
            if let Some(count) = self.counts.get(&bookmark.id) {
                bookmark.count = *count;
            }
        }
    }

    /// Persist counts, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("failed to create usage directory {}", dir.display())
            })?;
        }

        let data =
            serde_json::to_string_pretty(&self.counts).context("failed to serialize usage counts")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write usage counts to {}", self.path.display()))?;
        Ok(())
    }
}
