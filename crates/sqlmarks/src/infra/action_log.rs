//! Append-only log of actions taken on bookmarks.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::domain::model::Bookmark;

const RULE: &str = "==================================================";

#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry describing `action` on `bookmark`.
    pub fn record(&self, bookmark: &Bookmark, action: &str, count_after: u64) -> Result<()> {
        let timestamp = OffsetDateTime::now_utc()
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]Z"
            ))
            .context("failed to format action timestamp")?;

        let entry = format!(
            "\n{RULE}\nTimestamp: {timestamp}\nAction: {action}\nBookmark Title: {title}\n\
             Bookmark Details: {title} (File: {file}, Line: {line})\nBookmark ID: {id}\n\
             Usage Count After Action: {count_after}\n{RULE}\n",
            title = bookmark.title(),
            file = bookmark.file_name(),
            line = bookmark.line,
            id = bookmark.id,
        );

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open action log {}", self.path.display()))?;
        file.write_all(entry.as_bytes())
            .with_context(|| format!("failed to write action log {}", self.path.display()))?;

        tracing::info!(action, id = %bookmark.id, "recorded bookmark action");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = ActionLog::new(dir.path().join("logs/bookmark_actions.log"));
        let bookmark = Bookmark::from_export("file:///sql/q.sql".into(), "7", 7, "Weekly".into());

        log.record(&bookmark, "Copied SQL", 1)?;
        log.record(&bookmark, "Copied SQL", 2)?;

        let written = fs::read_to_string(log.path())?;
        assert_eq!(written.matches("Action: Copied SQL").count(), 2);
        assert!(written.contains("Bookmark ID: file:///sql/q.sql|7"));
        assert!(written.contains("(File: q.sql, Line: 7)"));
        assert!(written.contains("Usage Count After Action: 2"));
        Ok(())
    }
}
