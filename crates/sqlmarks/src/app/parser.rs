//! Parsing of IDE bookmark exports.
//!
//! Two export shapes are understood. Newer exports keep the location in a nested
//! `attributes/entry[@key]` element, older ones use flat `option[@name]` elements. The shape is
//! picked once per entry: a state with an `attributes` element is read structured only.

use std::fs;
use std::io;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::domain::errors::{LoadError, ParseError};
use crate::domain::model::{Bookmark, LINE_NUMBER_OFFSET};

const MANAGER_COMPONENT: &str = "BookmarkManager";
const STATE_TAG: &str = "BookmarkState";

type FieldStrategy = for<'a, 'input> fn(Node<'a, 'input>, &str) -> Option<&'a str>;

/// Read and parse an export file.
pub fn load_export(path: &Path) -> Result<Vec<Bookmark>, LoadError> {
    let document = match fs::read_to_string(path) {
        Ok(document) => document,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "bookmark export not found");
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let bookmarks = parse(&document).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "bookmark export is malformed");
        LoadError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(path = %path.display(), count = bookmarks.len(), "parsed bookmark export");
    Ok(bookmarks)
}

/// Parse an export document into bookmarks, in document order.
///
/// Entries lacking a url, line or description are dropped with a warning.
pub fn parse(document: &str) -> Result<Vec<Bookmark>, ParseError> {
    let document = Document::parse(document)?;

    let search_root = document
        .descendants()
        .find(|node| has_tag(*node, "component") && node.attribute("name") == Some(MANAGER_COMPONENT))
        .unwrap_or_else(|| document.root());

    let mut bookmarks = Vec::new();
    let mut seen_states = 0usize;
    for state in search_root
        .descendants()
        .filter(|node| has_tag(*node, STATE_TAG))
    {
        seen_states += 1;
        if let Some(bookmark) = bookmark_from_state(state) {
            bookmarks.push(bookmark);
        }
    }

    if seen_states == 0 {
        tracing::warn!("no {STATE_TAG} elements found in bookmark export");
    }

    Ok(bookmarks)
}

fn bookmark_from_state(state: Node<'_, '_>) -> Option<Bookmark> {
    let location = location_strategy(state);
    let description = field(state, option_value, "description");
    let url = field(state, location, "url");
    let raw_line = field(state, location, "line");

    let (Some(url), Some(raw_line), Some(description)) = (url, raw_line, description) else {
        tracing::warn!(
            url = url.unwrap_or_default(),
            line = raw_line.unwrap_or_default(),
            description = description.unwrap_or_default(),
            "skipping incomplete bookmark entry"
        );
        return None;
    };

    let Some(line) = raw_line
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|line| line.checked_add(LINE_NUMBER_OFFSET).is_some())
    else {
        tracing::warn!(url, line = raw_line, "skipping bookmark with invalid line number");
        return None;
    };

    Some(Bookmark::from_export(
        url.to_owned(),
        raw_line,
        line,
        description.to_owned(),
    ))
}

/// Structured lookup when the state has an `attributes` element, flat options otherwise.
fn location_strategy(state: Node<'_, '_>) -> FieldStrategy {
    if state.children().any(|node| has_tag(node, "attributes")) {
        attribute_entry
    } else {
        option_value
    }
}

fn field<'a>(state: Node<'a, '_>, strategy: FieldStrategy, key: &str) -> Option<&'a str> {
    strategy(state, key).filter(|value| !value.is_empty())
}

/// `<attributes><entry key="..." value="..."/></attributes>`
fn attribute_entry<'a>(state: Node<'a, '_>, key: &str) -> Option<&'a str> {
    state
        .children()
        .find(|node| has_tag(*node, "attributes"))?
        .children()
        .find(|node| has_tag(*node, "entry") && node.attribute("key") == Some(key))?
        .attribute("value")
}

/// `<option name="..." value="..."/>`
fn option_value<'a>(state: Node<'a, '_>, name: &str) -> Option<&'a str> {
    state
        .children()
        .find(|node| has_tag(*node, "option") && node.attribute("name") == Some(name))?
        .attribute("value")
}

fn has_tag(node: Node<'_, '_>, expected: &str) -> bool {
    node.is_element() && node.tag_name().name() == expected
}
