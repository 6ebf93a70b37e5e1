//! Domain-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The export document is not well-formed XML.
#[derive(Debug, Error)]
#[error("malformed bookmark export: {0}")]
pub struct ParseError(#[from] pub roxmltree::Error);

/// Failure to load an export file into a bookmark collection.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("bookmark export not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// Missing exports count as an empty collection rather than a failed load.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Outcome of asking for a bookmark's content when no text can be produced.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("file not found for '{reference}' (check the root directory setting)")]
    Unresolved { reference: String },
    #[error("line {line} is past the end of {} ({total} lines)", path.display())]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        total: usize,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
