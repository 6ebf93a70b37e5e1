//! Content lookup for bookmarks, from the vault or from resolved files.

use std::path::{Path, PathBuf};

use crate::app::resolve::{ResolveCache, ResolveContext};
use crate::app::slice;
use crate::domain::errors::ContentError;
use crate::domain::model::{Bookmark, ContentSpan};

/// Source of bookmark content consulted by the filter pipeline and the front end.
pub trait ContentSource: Sync {
    /// Produce the content of `bookmark`. `collection` supplies the neighbouring bookmarks that
    /// bound its span.
    fn content(&self, bookmark: &Bookmark, collection: &[Bookmark])
    -> Result<ContentSpan, ContentError>;
}

/// Resolves export bookmarks against the filesystem and slices their span.
#[derive(Debug, Default)]
pub struct Extractor {
    context: ResolveContext,
    cache: ResolveCache,
}

impl Extractor {
    pub fn new(context: ResolveContext) -> Self {
        Self {
            context,
            cache: ResolveCache::new(),
        }
    }

    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    /// Point the extractor at a different root directory. Cached resolutions are dropped.
    pub fn set_root_dir(&mut self, root_dir: Option<PathBuf>) {
        if self.context.root_dir != root_dir {
            tracing::info!(root = ?root_dir, "root directory changed");
            self.context.root_dir = root_dir;
            self.cache.invalidate();
        }
    }

    /// Resolve the file a bookmark points at.
    pub fn resolve(&self, bookmark: &Bookmark) -> Result<PathBuf, ContentError> {
        self.cache
            .resolve(&bookmark.url, &self.context)
            .ok_or_else(|| ContentError::Unresolved {
                reference: bookmark.url.clone(),
            })
    }

    /// Slice a bookmark's span from a path the caller already resolved.
    pub fn extract_from(
        &self,
        bookmark: &Bookmark,
        collection: &[Bookmark],
        path: &Path,
    ) -> Result<ContentSpan, ContentError> {
        slice::extract(bookmark, collection, path)
    }
}

impl ContentSource for Extractor {
    fn content(
        &self,
        bookmark: &Bookmark,
        collection: &[Bookmark],
    ) -> Result<ContentSpan, ContentError> {
        if let Some(sql) = bookmark.sql_content.as_ref().filter(|sql| !sql.is_empty()) {
            return Ok(ContentSpan::literal(sql.clone()));
        }

        let path = self.resolve(bookmark)?;
        self.extract_from(bookmark, collection, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn vault_records_skip_resolution() -> anyhow::Result<()> {
        let mut record = Bookmark::from_export(
            "vault://missing".into(),
            "0",
            0,
            "Vault query".into(),
        );
        record.sql_content = Some("select * from orders;".into());

        let extractor = Extractor::new(ResolveContext::default());
        let span = extractor.content(&record, &[])?;
        assert_eq!(span.text, "select * from orders;");
        Ok(())
    }

    #[test]
    fn unresolved_reference_is_reported() {
        let bookmark = Bookmark::from_export("$PROJECT_DIR$/none.sql".into(), "0", 0, "x".into());
        let extractor = Extractor::new(ResolveContext::default());
        assert!(matches!(
            extractor.content(&bookmark, &[]),
            Err(ContentError::Unresolved { .. })
        ));
    }

    #[test]
    fn export_bookmark_is_sliced_after_resolution() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join("q.sql"), "-- a\nselect 1;\n-- b\nselect 2;\n")?;
        let first = Bookmark::from_export("$PROJECT_DIR$/q.sql".into(), "0", 0, "a".into());
        let second = Bookmark::from_export("$PROJECT_DIR$/q.sql".into(), "2", 2, "b".into());
        let collection = vec![first.clone(), second.clone()];

        let mut extractor = Extractor::new(ResolveContext::default());
        assert!(extractor.content(&first, &collection).is_err());

        extractor.set_root_dir(Some(root.path().to_path_buf()));
        assert_eq!(extractor.content(&first, &collection)?.text, "-- a\nselect 1;\n");
        assert_eq!(extractor.content(&second, &collection)?.text, "-- b\nselect 2;\n");
        Ok(())
    }
}
