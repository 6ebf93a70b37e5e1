//! Read access to the internal query vault.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::model::Bookmark;

const VAULT_SCHEME: &str = "vault://";

/// A query stored directly in the vault, SQL included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VaultQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sql_content: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl VaultQuery {
    fn to_bookmark(&self, index: usize) -> Bookmark {
        let id = if self.id.is_empty() {
            format!("vault|{index}")
        } else {
            self.id.clone()
        };
        Bookmark {
            url: format!("{VAULT_SCHEME}{id}"),
            id,
            line: 0,
            description: self.title.clone(),
            count: self.count,
            labels: self.labels.clone(),
            sql_content: Some(self.sql_content.clone()),
        }
    }
}

/// JSON-backed list of vault queries.
#[derive(Debug, Clone, Default)]
pub struct VaultStore {
    path: PathBuf,
    queries: Vec<VaultQuery>,
}

impl VaultStore {
    /// Load the vault at `path`. A missing or corrupt file yields an empty vault.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "query vault not found, starting empty");
                return Ok(Self {
                    path,
                    queries: Vec::new(),
                });
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read query vault at {}", path.display()));
            }
        };

        let queries = serde_json::from_str::<Vec<VaultQuery>>(&data).unwrap_or_else(|err| {
            tracing::error!(path = %path.display(), error = %err, "query vault is corrupt, starting empty");
            Vec::new()
        });
        tracing::info!(path = %path.display(), count = queries.len(), "loaded query vault");
        Ok(Self { path, queries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn queries(&self) -> &[VaultQuery] {
        &self.queries
    }

    /// Sorted unique labels across all queries.
    pub fn all_labels(&self) -> Vec<String> {
        self.queries
            .iter()
            .flat_map(|query| query.labels.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Vault queries as pre-resolved bookmarks. Queries without a title are skipped.
    pub fn to_bookmarks(&self) -> Vec<Bookmark> {
        self.queries
            .iter()
            .enumerate()
            .filter(|(_, query)| {
                let keep = !query.title.trim().is_empty();
                if !keep {
                    tracing::warn!(id = %query.id, "skipping vault query without a title");
                }
                keep
            })
            .map(|(index, query)| query.to_bookmark(index))
            .collect()
    }
}
