//! The loaded bookmark collection and its reload lifecycle.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::parser;
use crate::domain::errors::LoadError;
use crate::domain::model::Bookmark;
use crate::infra::usage::UsageStore;
use crate::infra::vault::VaultStore;

/// Bookmark collection owned by the front end and passed to the engine on each call.
#[derive(Debug, Default, Clone)]
pub struct Library {
    bookmarks: Vec<Bookmark>,
    origin: Option<PathBuf>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// File the current collection was loaded from.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Replace the collection with the bookmarks of an export file.
    ///
    /// A missing export empties the collection. A malformed or unreadable one leaves the
    /// previous collection in place. Both are reported to the caller.
    pub fn reload_export(&mut self, path: &Path, usage: &UsageStore) -> Result<usize, LoadError> {
        match parser::load_export(path) {
            Ok(mut bookmarks) => {
                usage.apply(&mut bookmarks);
                self.bookmarks = bookmarks;
                self.origin = Some(path.to_path_buf());
                Ok(self.bookmarks.len())
            }
            Err(err) if err.is_not_found() => {
                self.bookmarks.clear();
                self.origin = None;
                Err(err)
            }
            Err(err) => {
                tracing::warn!(kept = self.bookmarks.len(), "keeping previous bookmarks after failed load");
                Err(err)
            }
        }
    }

    /// Replace the collection with the vault's queries.
    pub fn reload_vault(&mut self, vault: &VaultStore, usage: &UsageStore) -> usize {
        let mut bookmarks = vault.to_bookmarks();
        usage.apply(&mut bookmarks);
        self.bookmarks = bookmarks;
        self.origin = Some(vault.path().to_path_buf());
        self.bookmarks.len()
    }

    /// Look a bookmark up by identifier.
    pub fn find(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|bookmark| bookmark.id == id)
    }

    /// Reflect an updated usage count after an action.
    pub fn set_count(&mut self, id: &str, count: u64) -> bool {
        match self.bookmarks.iter_mut().find(|bookmark| bookmark.id == id) {
            Some(bookmark) => {
                bookmark.count = count;
                true
            }
            None => false,
        }
    }

    pub fn reset_counts(&mut self) {
        for bookmark in &mut self.bookmarks {
            bookmark.count = 0;
        }
    }
}

/// Keep a copy of a successfully loaded export so later sessions can reopen it.
pub fn remember_export(source: &Path, copy: &Path) -> Result<()> {
    if source == copy {
        return Ok(());
    }
    if let Some(dir) = copy.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create bookmark directory {}", dir.display()))?;
    }
    fs::copy(source, copy).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            copy.display()
        )
    })?;
    tracing::debug!(source = %source.display(), copy = %copy.display(), "stored export copy");
    Ok(())
}
