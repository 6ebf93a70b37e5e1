//! On-disk locations of application data.

use std::path::{Path, PathBuf};

use crate::infra::config::Config;

const APP_DIR: &str = "sqlmarks";

/// Layout of the application data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Configured data directory, else the platform data directory, else a hidden directory in
    /// the working directory.
    pub fn from_config(config: &Config) -> Self {
        let data_dir = config
            .storage
            .data_dir()
            .or_else(|| dirs_next::data_dir().map(|base| base.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR}_data")));
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn usage_counts(&self) -> PathBuf {
        self.data_dir.join("configs").join("usage_counts.json")
    }

    pub fn vault(&self) -> PathBuf {
        self.data_dir.join("query_vault").join("query_vault.json")
    }

    /// Copy of the most recently loaded export, used when no export is configured.
    pub fn last_export_copy(&self) -> PathBuf {
        self.data_dir.join("bookmarks").join("last_bookmarks_copy.xml")
    }

    pub fn actions_log(&self) -> PathBuf {
        self.data_dir.join("logs").join("bookmark_actions.log")
    }

    pub fn global_config() -> Option<PathBuf> {
        dirs_next::config_dir().map(|base| base.join(APP_DIR).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_data_dir_wins() {
        let mut config = Config::default();
        config.storage.data_dir = Some("/tmp/sqlmarks-data".into());
        let paths = AppPaths::from_config(&config);
        assert_eq!(paths.data_dir(), Path::new("/tmp/sqlmarks-data"));
        assert_eq!(
            paths.usage_counts(),
            Path::new("/tmp/sqlmarks-data/configs/usage_counts.json")
        );
    }
}
