//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::pipeline::SearchScope;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".sqlmarks/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub library: Library,
    #[serde(default)]
    pub resolve: Resolve,
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub storage: Storage,
}

/// Where bookmarks are loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum DataSource {
    /// IDE bookmark export (XML).
    #[default]
    Export,
    /// Internal query vault.
    Vault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Library {
    #[serde(default)]
    pub export_path: Option<String>,
    #[serde(default)]
    pub source: Option<DataSource>,
}

impl Library {
    pub fn export_path(&self) -> Option<PathBuf> {
        non_empty_path(self.export_path.as_deref())
    }

    pub fn source(&self) -> DataSource {
        self.source.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resolve {
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub cloud_markers: Option<Vec<String>>,
}

impl Resolve {
    fn default_cloud_markers() -> Vec<String> {
        crate::app::resolve::DEFAULT_CLOUD_MARKERS
            .iter()
            .map(|marker| (*marker).to_owned())
            .collect()
    }

    /// Directory substituted for the project placeholder, if configured.
    pub fn root_dir(&self) -> Option<PathBuf> {
        non_empty_path(self.root_dir.as_deref())
    }

    /// Sync folder names used for relocation. An empty list disables relocation.
    pub fn cloud_markers(&self) -> Vec<String> {
        self.cloud_markers
            .clone()
            .unwrap_or_else(Self::default_cloud_markers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Search {
    #[serde(default)]
    pub scope: Option<SearchScope>,
}

impl Search {
    pub fn scope(&self) -> SearchScope {
        self.scope.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Storage {
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl Storage {
    pub fn data_dir(&self) -> Option<PathBuf> {
        non_empty_path(self.data_dir.as_deref())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    root_dir: Option<String>,
    data_dir: Option<String>,
    export_path: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            root_dir: env::var("SQLMARKS_ROOT_DIR").ok(),
            data_dir: env::var("SQLMARKS_DATA_DIR").ok(),
            export_path: env::var("SQLMARKS_EXPORT").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(root_dir: &str, data_dir: &str) -> Self {
        Self {
            root_dir: Some(root_dir.to_owned()),
            data_dir: Some(data_dir.to_owned()),
            export_path: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            library: merge_library(self.library, other.library),
            resolve: merge_resolve(self.resolve, other.resolve),
            search: Search {
                scope: other.search.scope.or(self.search.scope),
            },
            storage: Storage {
                data_dir: other.storage.data_dir.or(self.storage.data_dir),
            },
        }
    }
}

fn merge_library(base: Library, overlay: Library) -> Library {
    Library {
        export_path: overlay.export_path.or(base.export_path),
        source: overlay.source.or(base.source),
    }
}

fn merge_resolve(base: Resolve, overlay: Resolve) -> Resolve {
    Resolve {
        root_dir: overlay.root_dir.or(base.root_dir),
        cloud_markers: overlay.cloud_markers.or(base.cloud_markers),
    }
}

fn non_empty_path(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("sqlmarks/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(root_dir) = env.root_dir {
        config.resolve.root_dir = Some(root_dir);
    }
    if let Some(data_dir) = env.data_dir {
        config.storage.data_dir = Some(data_dir);
    }
    if let Some(export_path) = env.export_path {
        config.library.export_path = Some(export_path);
    }
    config
}
