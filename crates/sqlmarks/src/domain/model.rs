//! Domain models for bookmarks and the text spans they point at.

use std::path::Path;

/// Stored bookmark lines are zero-based, file lines are one-based.
pub const LINE_NUMBER_OFFSET: usize = 1;

/// A saved reference to a SQL snippet, sourced from an IDE export or the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    /// Zero-based line as stored by the export.
    pub line: usize,
    pub description: String,
    pub count: u64,
    pub labels: Vec<String>,
    /// Literal SQL for vault records; such bookmarks never touch the filesystem.
    pub sql_content: Option<String>,
}

impl Bookmark {
    /// Build an export bookmark. `raw_line` is the line exactly as written in the document and
    /// feeds the identifier.
    pub fn from_export(url: String, raw_line: &str, line: usize, description: String) -> Self {
        Self {
            id: bookmark_id(&url, raw_line),
            url,
            line,
            description,
            count: 0,
            labels: Vec::new(),
            sql_content: None,
        }
    }

    /// Title shown to users. The description doubles as the title.
    pub fn title(&self) -> &str {
        &self.description
    }

    /// One-based line in the referenced file where this bookmark's span starts.
    pub fn start_line(&self) -> usize {
        self.line.saturating_add(LINE_NUMBER_OFFSET)
    }

    /// Whether the bookmark already carries its SQL and must skip resolution.
    pub fn is_pre_resolved(&self) -> bool {
        self.sql_content
            .as_deref()
            .is_some_and(|content| !content.is_empty())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|existing| existing == label)
    }

    /// File name portion of the reference, used in listings.
    pub fn file_name(&self) -> &str {
        let trimmed = self.url.strip_prefix("file://").unwrap_or(&self.url);
        Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(trimmed)
    }
}

/// Identifier shared by the usage store and the parser.
pub fn bookmark_id(url: &str, raw_line: &str) -> String {
    format!("{url}|{raw_line}")
}

/// Text attributed to one bookmark, with one-based inclusive line bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

impl ContentSpan {
    /// Span for content that did not come from a file, such as vault records.
    pub fn literal(text: String) -> Self {
        let end_line = text.lines().count().max(1);
        Self {
            start_line: 1,
            end_line,
            text,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }
}
