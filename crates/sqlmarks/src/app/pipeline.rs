//! Filtering and ordering of bookmark collections for presentation.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::app::content::ContentSource;
use crate::domain::model::Bookmark;

/// Which parts of a bookmark a search term is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum SearchScope {
    /// Description only.
    Title,
    /// Referenced SQL only.
    Content,
    /// Description first, then SQL.
    #[default]
    Both,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Title => "title",
            SearchScope::Content => "content",
            SearchScope::Both => "both",
        }
    }

    fn includes_title(self) -> bool {
        matches!(self, SearchScope::Title | SearchScope::Both)
    }

    fn includes_content(self) -> bool {
        matches!(self, SearchScope::Content | SearchScope::Both)
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = SearchScopeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" | "name" => Ok(SearchScope::Title),
            "content" | "sql" | "syntax" => Ok(SearchScope::Content),
            "both" | "all" => Ok(SearchScope::Both),
            other => Err(SearchScopeParseError::Unknown(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`SearchScope`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SearchScopeParseError {
    #[error("unknown search scope '{0}'")]
    Unknown(String),
}

/// Search and label criteria for [`select`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub term: Option<String>,
    pub scope: SearchScope,
    pub label: Option<String>,
}

impl Query {
    pub fn new(term: Option<String>, scope: SearchScope, label: Option<String>) -> Self {
        Self { term, scope, label }
    }

    fn needle(&self) -> Option<String> {
        self.term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

/// Filter `bookmarks` by label and search term, then order them by usage.
///
/// Content is only requested from `source` when the scope includes content, and never for a
/// bookmark whose title already matched.
pub fn select<'a>(
    bookmarks: &'a [Bookmark],
    query: &Query,
    source: &dyn ContentSource,
) -> Vec<&'a Bookmark> {
    let labelled: Vec<&Bookmark> = match query.label.as_deref() {
        Some(label) => bookmarks
            .iter()
            .filter(|bookmark| bookmark.has_label(label))
            .collect(),
        None => bookmarks.iter().collect(),
    };

    let mut selected = match query.needle() {
        None => labelled,
        Some(needle) if query.scope.includes_content() => labelled
            .into_par_iter()
            .filter(|bookmark| matches(bookmark, &needle, query.scope, bookmarks, source))
            .collect(),
        Some(needle) => labelled
            .into_iter()
            .filter(|bookmark| matches(bookmark, &needle, query.scope, bookmarks, source))
            .collect(),
    };

    tracing::debug!(
        total = bookmarks.len(),
        selected = selected.len(),
        scope = %query.scope,
        "filtered bookmarks"
    );

    sort_by_usage(&mut selected);
    selected
}

/// Most used first, then alphabetically by description. Equal keys keep their order.
pub fn sort_by_usage(bookmarks: &mut [&Bookmark]) {
    bookmarks.sort_by(|a, b| usage_order(a, b));
}

fn usage_order(a: &Bookmark, b: &Bookmark) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.description.to_lowercase().cmp(&b.description.to_lowercase()))
}

fn matches(
    bookmark: &Bookmark,
    needle: &str,
    scope: SearchScope,
    collection: &[Bookmark],
    source: &dyn ContentSource,
) -> bool {
    if scope.includes_title() && bookmark.description.to_lowercase().contains(needle) {
        return true;
    }
    if !scope.includes_content() {
        return false;
    }

    match source.content(bookmark, collection) {
        Ok(span) => span.text.to_lowercase().contains(needle),
        Err(err) => {
            tracing::debug!(id = %bookmark.id, error = %err, "content unavailable for search");
            false
        }
    }
}

/// Unique labels across the collection, sorted.
pub fn all_labels(bookmarks: &[Bookmark]) -> Vec<String> {
    bookmarks
        .iter()
        .flat_map(|bookmark| bookmark.labels.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use crate::domain::errors::ContentError;
    use crate::domain::model::ContentSpan;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        texts: HashMap<String, String>,
    }

    impl CountingSource {
        fn with(texts: &[(&str, &str)]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts: texts
                    .iter()
                    .map(|(id, text)| ((*id).to_owned(), (*text).to_owned()))
                    .collect(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    impl ContentSource for CountingSource {
        fn content(
            &self,
            bookmark: &Bookmark,
            _collection: &[Bookmark],
        ) -> Result<ContentSpan, ContentError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.texts
                .get(&bookmark.id)
                .map(|text| ContentSpan::literal(text.clone()))
                .ok_or_else(|| ContentError::Unresolved {
                    reference: bookmark.url.clone(),
                })
        }
    }

    fn bookmark(title: &str, count: u64) -> Bookmark {
        let mut bookmark = Bookmark::from_export(format!("{title}.sql"), "0", 0, title.into());
        bookmark.count = count;
        bookmark
    }

    fn titles(selected: &[&Bookmark]) -> Vec<String> {
        selected.iter().map(|b| b.description.clone()).collect()
    }

    #[test]
    fn orders_by_count_then_title() {
        let bookmarks = vec![bookmark("B", 1), bookmark("A", 1), bookmark("C", 2)];
        let source = CountingSource::default();
        let selected = select(&bookmarks, &Query::default(), &source);
        assert_eq!(titles(&selected), ["C", "A", "B"]);
    }

    #[test]
    fn title_order_ignores_case_and_is_stable() {
        let mut first = bookmark("report", 0);
        first.url = "one.sql".into();
        let mut second = bookmark("Report", 0);
        second.url = "two.sql".into();
        let bookmarks = vec![bookmark("beta", 0), first, second, bookmark("Alpha", 0)];

        let selected = select(&bookmarks, &Query::default(), &CountingSource::default());
        assert_eq!(titles(&selected), ["Alpha", "beta", "report", "Report"]);
        assert_eq!(selected[2].url, "one.sql");
    }

    #[test]
    fn title_scope_never_reads_content() {
        let bookmarks = vec![bookmark("Select users", 0), bookmark("Orders", 3)];
        let source = CountingSource::with(&[("Orders.sql|0", "select * from orders")]);
        let query = Query::new(Some("select".into()), SearchScope::Title, None);

        let selected = select(&bookmarks, &query, &source);
        assert_eq!(titles(&selected), ["Select users"]);
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn both_scope_skips_content_for_title_matches() {
        let bookmarks = vec![bookmark("Select users", 0), bookmark("Orders", 3)];
        let source = CountingSource::with(&[("Orders.sql|0", "SELECT * FROM orders")]);
        let query = Query::new(Some("select".into()), SearchScope::Both, None);

        let selected = select(&bookmarks, &query, &source);
        assert_eq!(titles(&selected), ["Orders", "Select users"]);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn content_scope_ignores_titles_and_failures() {
        let bookmarks = vec![bookmark("Select users", 0), bookmark("Orders", 0)];
        let source = CountingSource::with(&[("Orders.sql|0", "delete from orders")]);
        let query = Query::new(Some("select".into()), SearchScope::Content, None);

        assert!(select(&bookmarks, &query, &source).is_empty());
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn label_filter_applies_before_search() {
        let mut tagged = bookmark("Revenue", 0);
        tagged.labels = vec!["finance".into()];
        let bookmarks = vec![tagged, bookmark("Revenue draft", 5)];
        let query = Query::new(Some("revenue".into()), SearchScope::Title, Some("finance".into()));

        let selected = select(&bookmarks, &query, &CountingSource::default());
        assert_eq!(titles(&selected), ["Revenue"]);
    }

    #[test]
    fn blank_term_keeps_everything() {
        let bookmarks = vec![bookmark("a", 0), bookmark("b", 0)];
        let source = CountingSource::default();
        let query = Query::new(Some("   ".into()), SearchScope::Content, None);
        assert_eq!(select(&bookmarks, &query, &source).len(), 2);
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn select_leaves_collection_untouched() {
        let bookmarks = vec![bookmark("B", 1), bookmark("A", 1), bookmark("C", 2)];
        let before = bookmarks.clone();
        let _ = select(&bookmarks, &Query::default(), &CountingSource::default());
        assert_eq!(bookmarks, before);
    }

    #[test]
    fn collects_unique_sorted_labels() {
        let mut a = bookmark("a", 0);
        a.labels = vec!["ops".into(), "finance".into()];
        let mut b = bookmark("b", 0);
        b.labels = vec!["finance".into()];
        assert_eq!(all_labels(&[a, b]), ["finance", "ops"]);
    }

    #[test]
    fn parses_scope_aliases() {
        assert_eq!("SQL".parse::<SearchScope>(), Ok(SearchScope::Content));
        assert_eq!("name".parse::<SearchScope>(), Ok(SearchScope::Title));
        assert!("everything".parse::<SearchScope>().is_err());
    }
}
