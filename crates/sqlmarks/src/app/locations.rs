//! Help text describing where application files live.

use anyhow::{Result, anyhow};
use minijinja::Environment;
use serde::Serialize;

use crate::infra::paths::AppPaths;

const LOCATIONS_TEMPLATE: &str = r#"sqlmarks file locations
=======================
Application data folder:
  {{ data_dir }}

Configuration file:
  {{ config_file or "(no platform config directory)" }}

Usage counts file:
  {{ usage_counts }}

Query vault file:
  {{ vault }}

Copied bookmarks file (last loaded):
  {{ last_export }}

Bookmark actions log:
  {{ actions_log }}
{% if root_dir %}

Root directory for $PROJECT_DIR$:
  {{ root_dir }}
{% endif %}
"#;

#[derive(Debug, Serialize)]
struct LocationsContext {
    data_dir: String,
    config_file: Option<String>,
    usage_counts: String,
    vault: String,
    last_export: String,
    actions_log: String,
    root_dir: Option<String>,
}

/// Render the file locations help text.
pub fn render(paths: &AppPaths, root_dir: Option<&std::path::Path>) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("locations", LOCATIONS_TEMPLATE)
        .map_err(|err| anyhow!("failed to register locations template: {err}"))?;

    let context = LocationsContext {
        data_dir: paths.data_dir().display().to_string(),
        config_file: AppPaths::global_config().map(|path| path.display().to_string()),
        usage_counts: paths.usage_counts().display().to_string(),
        vault: paths.vault().display().to_string(),
        last_export: paths.last_export_copy().display().to_string(),
        actions_log: paths.actions_log().display().to_string(),
        root_dir: root_dir.map(|path| path.display().to_string()),
    };

    env.get_template("locations")
        .and_then(|template| template.render(&context))
        .map_err(|err| anyhow!("failed to render locations: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lists_every_data_file() -> Result<()> {
        let paths = AppPaths::new("/data/sqlmarks");
        let text = render(&paths, None)?;
        assert!(text.contains("/data/sqlmarks/configs/usage_counts.json"));
        assert!(text.contains("/data/sqlmarks/query_vault/query_vault.json"));
        assert!(text.contains("/data/sqlmarks/bookmarks/last_bookmarks_copy.xml"));
        assert!(text.contains("/data/sqlmarks/logs/bookmark_actions.log"));
        assert!(!text.contains("$PROJECT_DIR$"));
        Ok(())
    }

    #[test]
    fn mentions_root_directory_when_set() -> Result<()> {
        let paths = AppPaths::new("/data/sqlmarks");
        let text = render(&paths, Some(Path::new("/srv/sql")))?;
        assert!(text.contains("Root directory for $PROJECT_DIR$:\n  /srv/sql"));
        Ok(())
    }
}
