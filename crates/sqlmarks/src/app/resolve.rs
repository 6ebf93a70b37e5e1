//! Resolution of stored bookmark references to files on disk.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;

use crate::infra::config::Config;

const FILE_SCHEME: &str = "file://";
pub const PROJECT_DIR_PLACEHOLDER: &str = "$PROJECT_DIR$";
pub const USER_HOME_PLACEHOLDER: &str = "$USER_HOME$";

/// Folder names of sync clients whose tree moves along with the user profile.
pub const DEFAULT_CLOUD_MARKERS: &[&str] = &["OneDrive", "Dropbox", "Google Drive", "iCloudDrive"];

/// Directories substituted into references during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveContext {
    pub root_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub cloud_markers: Vec<String>,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ResolveContext {
    pub fn new(root_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> Self {
        Self {
            root_dir,
            home_dir,
            cloud_markers: DEFAULT_CLOUD_MARKERS
                .iter()
                .map(|marker| (*marker).to_owned())
                .collect(),
        }
    }

    /// Build a context from the configured root directory and the user's home directory.
    pub fn from_config(config: &Config) -> Self {
        Self {
            root_dir: config.resolve.root_dir(),
            home_dir: dirs_next::home_dir(),
            cloud_markers: config.resolve.cloud_markers(),
        }
    }

    pub fn with_cloud_markers(mut self, markers: Vec<String>) -> Self {
        self.cloud_markers = markers;
        self
    }
}

/// Apply scheme stripping, placeholder substitution and normalization without touching disk.
pub fn normalize_reference(raw_ref: &str, ctx: &ResolveContext) -> String {
    let mut path = strip_scheme(raw_ref.trim());

    if let Some(root) = &ctx.root_dir {
        path = path.replace(PROJECT_DIR_PLACEHOLDER, &root.to_string_lossy());
    }
    if let Some(home) = &ctx.home_dir {
        path = path.replace(USER_HOME_PLACEHOLDER, &home.to_string_lossy());
    }

    normalize_separators(&path)
}

/// Find the existing file a reference points at, or `None` when every heuristic fails.
pub fn resolve(raw_ref: &str, ctx: &ResolveContext) -> Option<PathBuf> {
    if raw_ref.trim().is_empty() {
        return None;
    }

    let normalized = normalize_reference(raw_ref, ctx);
    let direct = PathBuf::from(&normalized);
    if is_file(&direct) {
        return Some(absolute(direct));
    }

    if let Some(root) = &ctx.root_dir {
        if direct.is_relative() {
            let candidate = root.join(&direct);
            if is_file(&candidate) {
                tracing::debug!(reference = raw_ref, path = %candidate.display(), "resolved under root directory");
                return Some(absolute(candidate));
            }
        }

        if let Some(name) = basename(&normalized) {
            let candidate = root.join(name);
            if is_file(&candidate) {
                tracing::debug!(reference = raw_ref, path = %candidate.display(), "resolved by file name under root directory");
                return Some(absolute(candidate));
            }
        }
    }

    if let Some(candidate) = relocate(&normalized, ctx)
        && is_file(&candidate)
    {
        tracing::debug!(reference = raw_ref, path = %candidate.display(), "resolved relocated sync folder");
        return Some(absolute(candidate));
    }

    tracing::debug!(reference = raw_ref, normalized = %normalized, "reference unresolved");
    None
}

/// Session cache of successful resolutions keyed by reference and root directory.
///
/// The cache empties itself whenever it sees a different root directory.
#[derive(Debug, Default)]
pub struct ResolveCache {
    root: Mutex<Option<PathBuf>>,
    entries: DashMap<(String, Option<PathBuf>), PathBuf>,
}

impl ResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, raw_ref: &str, ctx: &ResolveContext) -> Option<PathBuf> {
        self.sync_root(ctx.root_dir.as_deref());

        let key = (raw_ref.to_owned(), ctx.root_dir.clone());
        if let Some(hit) = self.entries.get(&key) {
            if is_file(hit.value()) {
                return Some(hit.value().clone());
            }
        }
        self.entries.remove(&key);

        let resolved = resolve(raw_ref, ctx)?;
        self.entries.insert(key, resolved.clone());
        Some(resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn invalidate(&self) {
        self.entries.clear();
    }

    fn sync_root(&self, root: Option<&Path>) {
        let mut current = self.root.lock();
        if current.as_deref() != root {
            self.entries.clear();
            *current = root.map(Path::to_path_buf);
        }
    }
}

fn strip_scheme(raw_ref: &str) -> String {
    let Some(rest) = raw_ref.strip_prefix(FILE_SCHEME) else {
        return raw_ref.to_owned();
    };
    let decoded = percent_decode_str(rest).decode_utf8_lossy();
    strip_drive_separator(&decoded).to_owned()
}

/// `/C:/dir` -> `C:/dir`
fn strip_drive_separator(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 3
        && (bytes[0] == b'/' || bytes[0] == b'\\')
        && bytes[1].is_ascii_alphabetic()
        && bytes[2] == b':'
    {
        &path[1..]
    } else {
        path
    }
}

fn normalize_separators(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if is_drive(last) => {}
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn basename(normalized: &str) -> Option<&str> {
    normalized
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != ".." && !is_drive(name))
}

fn relocate(normalized: &str, ctx: &ResolveContext) -> Option<PathBuf> {
    let home = ctx.home_dir.as_ref()?;
    let segments: Vec<&str> = normalized.split('/').collect();
    let start = ctx
        .cloud_markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .find_map(|marker| {
            segments
                .iter()
                .position(|segment| segment.starts_with(marker.as_str()))
        })?;
    Some(home.join(segments[start..].join("/")))
}

fn is_file(path: &Path) -> bool {
    path.is_file()
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}
