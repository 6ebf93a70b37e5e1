//! Extraction of the text span a bookmark refers to.
//!
//! A bookmark owns the lines from its own line up to, but excluding, the next bookmark in the
//! same file. The last bookmark of a file runs to end of file.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::errors::ContentError;
use crate::domain::model::{Bookmark, ContentSpan};

/// Compute the one-based span bounds of `bookmark` among its siblings.
///
/// Returns the inclusive start line and the exclusive end line, where `None` means end of file.
/// Siblings with a different url are ignored.
pub fn span_bounds(bookmark: &Bookmark, siblings: &[Bookmark]) -> (usize, Option<usize>) {
    let start = bookmark.start_line();

    let mut starts: Vec<usize> = siblings
        .iter()
        .filter(|sibling| sibling.url == bookmark.url)
        .map(Bookmark::start_line)
        .collect();
    if !starts.contains(&start) {
        starts.push(start);
    }
    starts.sort_unstable();

    let next = starts
        .iter()
        .position(|line| *line == start)
        .and_then(|position| starts.get(position + 1).copied());

    let end = match next {
        Some(end) if end <= start => Some(start + 1),
        other => other,
    };
    (start, end)
}

/// Read the span of `bookmark` from the already resolved `path`.
pub fn extract(
    bookmark: &Bookmark,
    siblings: &[Bookmark],
    path: &Path,
) -> Result<ContentSpan, ContentError> {
    let (start, end) = span_bounds(bookmark, siblings);
    let read_error = |source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let (lines, total) = read_lines(BufReader::new(file), start, end).map_err(read_error)?;

    if lines.is_empty() {
        return Err(ContentError::LineOutOfRange {
            path: path.to_path_buf(),
            line: start,
            total,
        });
    }

    Ok(ContentSpan {
        start_line: start,
        end_line: start + lines.len() - 1,
        text: lines.concat(),
    })
}

/// Collect raw lines (terminators kept) in `[start, end)`, one-based. Also returns how many lines
/// were read, which equals the file's line count whenever no line was collected.
fn read_lines<R: BufRead>(
    mut reader: R,
    start: usize,
    end: Option<usize>,
) -> std::io::Result<(Vec<String>, usize)> {
    let mut raw = Vec::new();
    let mut lines = Vec::new();
    let mut number = 0;

    loop {
        if end.is_some_and(|end| number + 1 >= end) {
            break;
        }

        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        number += 1;

        if number >= start {
            let text = String::from_utf8_lossy(&raw);
            if matches!(text, Cow::Owned(_)) {
                tracing::debug!(line = number, "invalid UTF-8 replaced in bookmark content");
            }
            lines.push(text.into_owned());
        }
    }

    Ok((lines, number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn bookmark(url: &str, line: usize) -> Bookmark {
        Bookmark::from_export(url.into(), &line.to_string(), line, format!("at {line}"))
    }

    fn numbered_file(dir: &Path, lines: usize) -> anyhow::Result<PathBuf> {
        let path = dir.join("q.sql");
        let content: String = (1..=lines).map(|n| format!("line {n}\n")).collect();
        fs::write(&path, content)?;
        Ok(path)
    }

    #[test]
    fn neighbour_bounds_the_span() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = numbered_file(dir.path(), 20)?;
        // stored lines are zero-based: one-based 5 and 12
        let first = bookmark("q.sql", 4);
        let second = bookmark("q.sql", 11);
        let all = vec![second.clone(), first.clone()];

        let span = extract(&first, &all, &path)?;
        assert_eq!((span.start_line, span.end_line), (5, 11));
        assert!(span.text.starts_with("line 5\n"));
        assert!(span.text.ends_with("line 11\n"));

        let span = extract(&second, &all, &path)?;
        assert_eq!((span.start_line, span.end_line), (12, 20));
        assert_eq!(span.line_count(), 9);
        Ok(())
    }

    #[test]
    fn lone_bookmark_runs_to_end_of_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = numbered_file(dir.path(), 10)?;
        let only = bookmark("q.sql", 2);

        let span = extract(&only, std::slice::from_ref(&only), &path)?;
        assert_eq!((span.start_line, span.end_line), (3, 10));
        assert_eq!(span.text.lines().count(), 8);
        Ok(())
    }

    #[test]
    fn other_files_do_not_bound_the_span() {
        let target = bookmark("a.sql", 0);
        let others = vec![target.clone(), bookmark("b.sql", 3)];
        assert_eq!(span_bounds(&target, &others), (1, None));
    }

    #[test]
    fn duplicate_lines_yield_single_line() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = numbered_file(dir.path(), 10)?;
        let mut twin = bookmark("q.sql", 4);
        twin.description = "twin".into();
        let original = bookmark("q.sql", 4);
        let all = vec![original.clone(), twin, bookmark("q.sql", 8)];

        assert_eq!(span_bounds(&original, &all), (5, Some(6)));
        let span = extract(&original, &all, &path)?;
        assert_eq!(span.text, "line 5\n");
        Ok(())
    }

    #[test]
    fn last_line_without_terminator_is_kept() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tail.sql");
        fs::write(&path, "select 1;\nselect 2;")?;
        let tail = bookmark("tail.sql", 1);

        let span = extract(&tail, &[], &path)?;
        assert_eq!(span.text, "select 2;");
        Ok(())
    }

    #[test]
    fn line_past_end_is_unavailable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = numbered_file(dir.path(), 3)?;
        let beyond = bookmark("q.sql", 3);

        match extract(&beyond, &[], &path) {
            Err(ContentError::LineOutOfRange { line, total, .. }) => {
                assert_eq!(line, 4);
                assert_eq!(total, 3);
            }
            other => panic!("expected out of range, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn vanished_file_is_a_read_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("gone.sql");
        let result = extract(&bookmark("gone.sql", 0), &[], &missing);
        assert!(matches!(result, Err(ContentError::Read { .. })));
        Ok(())
    }
}
