//! Text rendering of bookmarks and engine outcomes.

use crate::app::pipeline::Query;
use crate::domain::errors::{ContentError, LoadError};
use crate::domain::model::{Bookmark, ContentSpan};
use crate::infra::config::DataSource;

/// One listing line: rank, usage count, title and where the SQL lives.
pub fn bookmark_row(rank: usize, bookmark: &Bookmark) -> String {
    let location = if bookmark.is_pre_resolved() {
        if bookmark.labels.is_empty() {
            "vault".to_owned()
        } else {
            format!("vault: {}", bookmark.labels.join(", "))
        }
    } else {
        format!("{}:{}", bookmark.file_name(), bookmark.start_line())
    };
    format!(
        "#{rank}  [{count}]  {title}  ({location})",
        count = bookmark.count,
        title = bookmark.title(),
    )
}

/// Content as shown to users: surrounding whitespace removed.
pub fn content(span: &ContentSpan) -> &str {
    span.text.trim()
}

/// SQL-comment styled explanation of why no content is shown.
pub fn content_error(err: &ContentError) -> String {
    match err {
        ContentError::Unresolved { reference } => format!(
            "-- File not found for '{reference}'.\n\
             -- Check the root directory setting (--root-dir or resolve.root_dir)."
        ),
        ContentError::LineOutOfRange { path, line, total } => format!(
            "-- Line {line} is past the end of {} ({total} lines).\n\
             -- The file may have changed since the bookmark was exported.",
            path.display()
        ),
        ContentError::Read { path, source } => {
            format!("-- Could not read {}: {source}", path.display())
        }
    }
}

pub fn load_notice(err: &LoadError) -> String {
    match err {
        LoadError::NotFound(path) => format!(
            "Bookmarks file not found at {}. Pass --export to select a valid file.",
            path.display()
        ),
        LoadError::Parse { path, source } => {
            format!("Failed to parse bookmarks file {}: {source}", path.display())
        }
        LoadError::Io { path, source } => {
            format!("Failed to read bookmarks file {}: {source}", path.display())
        }
    }
}

/// Message shown when a listing comes back empty.
pub fn empty_listing(query: &Query, collection_empty: bool, source: DataSource) -> &'static str {
    let searching = query
        .term
        .as_deref()
        .is_some_and(|term| !term.trim().is_empty());
    match (searching || query.label.is_some(), collection_empty, source) {
        (true, _, _) => "No queries match your search.",
        (false, true, DataSource::Export) => "No queries loaded. Use --export to load an XML file.",
        (false, true, DataSource::Vault) => "No queries in vault.",
        (false, false, _) => "No queries available.",
    }
}
