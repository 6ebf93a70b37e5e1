//! Command-line front end.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::content::{ContentSource, Extractor};
use crate::app::library::{self, Library};
use crate::app::locations;
use crate::app::pipeline::{self, Query, SearchScope};
use crate::app::resolve::{self, ResolveContext};
use crate::domain::model::Bookmark;
use crate::infra::action_log::ActionLog;
use crate::infra::clipboard::Clipboard;
use crate::infra::config::{Config, DataSource};
use crate::infra::paths::AppPaths;
use crate::infra::usage::UsageStore;
use crate::infra::vault::VaultStore;
use crate::ui::render;

const COPY_ACTION: &str = "Copied SQL";

#[derive(Debug, Parser)]
#[command(
    name = "sqlmarks",
    author,
    version,
    about = "Browse and copy SQL snippets saved as IDE bookmarks",
    long_about = None
)]
pub struct Cli {
    /// Bookmark export (XML) to load
    #[arg(long, global = true, value_name = "FILE")]
    pub export: Option<PathBuf>,
    /// Where bookmarks come from
    #[arg(long, global = true, value_enum)]
    pub source: Option<DataSource>,
    /// Directory substituted for $PROJECT_DIR$ in bookmark references
    #[arg(long, global = true, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,
    /// Directory holding usage counts, the vault and logs
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List bookmarks, most used first
    List {
        /// Case-insensitive search term
        #[arg(short, long)]
        search: Option<String>,
        /// What the search term is matched against
        #[arg(long, value_enum)]
        scope: Option<SearchScope>,
        /// Only bookmarks carrying this label
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Print the SQL of a bookmark, by rank in the listing or by id
    Show { selector: String },
    /// Copy the SQL of a bookmark and count the use
    Copy {
        selector: String,
        /// Print the SQL instead of using the clipboard
        #[arg(long)]
        stdout: bool,
        /// Copy the bookmark's file URL instead of its SQL
        #[arg(long)]
        url: bool,
    },
    /// Resolve a raw bookmark reference to a file on disk
    Resolve { reference: String },
    /// List labels in use
    Labels,
    /// Manage usage counts
    Counts {
        #[command(subcommand)]
        action: CountsAction,
    },
    /// Show where data files are stored
    Locations,
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum CountsAction {
    /// Reset every usage count to zero
    Clear,
}

impl Cli {
    /// Command-line flags take precedence over every configuration layer.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(export) = &self.export {
            config.library.export_path = Some(export.display().to_string());
        }
        if let Some(source) = self.source {
            config.library.source = Some(source);
        }
        if let Some(root_dir) = &self.root_dir {
            config.resolve.root_dir = Some(root_dir.display().to_string());
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = Some(data_dir.display().to_string());
        }
    }
}

/// Load configuration, then execute the parsed command against stdout.
pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);

    let mut app = CliApp::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.execute(cli.command, &mut out)
}

/// State shared by the commands of one invocation.
pub struct CliApp {
    config: Config,
    paths: AppPaths,
    usage: UsageStore,
    library: Library,
    extractor: Extractor,
    actions: ActionLog,
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let paths = AppPaths::from_config(&config);
        let usage = UsageStore::load(paths.usage_counts())?;
        let extractor = Extractor::new(ResolveContext::from_config(&config));
        let actions = ActionLog::new(paths.actions_log());
        Ok(Self {
            config,
            paths,
            usage,
            library: Library::new(),
            extractor,
            actions,
        })
    }

    pub fn execute(&mut self, command: Commands, out: &mut impl Write) -> Result<()> {
        match command {
            Commands::List {
                search,
                scope,
                label,
            } => {
                self.load_library()?;
                let scope = scope.unwrap_or_else(|| self.config.search.scope());
                let query = Query::new(search, scope, label);
                self.list(&query, out)
            }
            Commands::Show { selector } => {
                self.load_library()?;
                self.show(&selector, out)
            }
            Commands::Copy {
                selector,
                stdout,
                url: true,
            } => {
                self.load_library()?;
                self.copy_url(&selector, stdout, out)
            }
            Commands::Copy {
                selector, stdout, ..
            } => {
                self.load_library()?;
                self.copy(&selector, stdout, out)
            }
            Commands::Resolve { reference } => self.resolve(&reference, out),
            Commands::Labels => {
                self.load_library()?;
                for label in pipeline::all_labels(self.library.bookmarks()) {
                    writeln!(out, "{label}")?;
                }
                Ok(())
            }
            Commands::Counts {
                action: CountsAction::Clear,
            } => {
                self.load_library()?;
                self.usage.clear();
                self.usage.save()?;
                self.library.reset_counts();
                writeln!(out, "All bookmark usage counts have been reset.")?;
                Ok(())
            }
            Commands::Locations => {
                let text = locations::render(&self.paths, self.config.resolve.root_dir().as_deref())?;
                write!(out, "{text}")?;
                Ok(())
            }
            Commands::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "sqlmarks", out);
                Ok(())
            }
        }
    }

    /// Fill the library from the configured source. A missing export is reported and leaves the
    /// library empty; a malformed one aborts the command.
    fn load_library(&mut self) -> Result<()> {
        match self.config.library.source() {
            DataSource::Vault => {
                let vault = VaultStore::load(self.paths.vault())?;
                self.library.reload_vault(&vault, &self.usage);
                Ok(())
            }
            DataSource::Export => {
                let configured = self.config.library.export_path();
                let fallback = self.paths.last_export_copy();
                let Some(path) = configured
                    .clone()
                    .or_else(|| fallback.exists().then(|| fallback.clone()))
                else {
                    tracing::info!("no bookmark export configured");
                    return Ok(());
                };

                match self.library.reload_export(&path, &self.usage) {
                    Ok(count) => {
                        tracing::info!(path = %path.display(), count, "bookmarks loaded");
                        if configured.is_some()
                            && let Err(err) = library::remember_export(&path, &fallback)
                        {
                            tracing::warn!(error = %err, "could not keep a copy of the export");
                        }
                        Ok(())
                    }
                    Err(err) if err.is_not_found() => {
                        eprintln!("{}", render::load_notice(&err));
                        Ok(())
                    }
                    Err(err) => {
                        let notice = render::load_notice(&err);
                        Err(err).context(notice)
                    }
                }
            }
        }
    }

    fn list(&self, query: &Query, out: &mut impl Write) -> Result<()> {
        let selected = pipeline::select(self.library.bookmarks(), query, &self.extractor);
        if selected.is_empty() {
            writeln!(
                out,
                "{}",
                render::empty_listing(query, self.library.is_empty(), self.config.library.source())
            )?;
            return Ok(());
        }

        for (index, bookmark) in selected.iter().enumerate() {
            writeln!(out, "{}", render::bookmark_row(index + 1, bookmark))?;
        }
        Ok(())
    }

    fn show(&self, selector: &str, out: &mut impl Write) -> Result<()> {
        let bookmark = self.pick(selector)?;
        match self.extractor.content(bookmark, self.library.bookmarks()) {
            Ok(span) => writeln!(out, "{}", render::content(&span))?,
            Err(err) => {
                tracing::warn!(id = %bookmark.id, error = %err, "content unavailable");
                writeln!(out, "{}", render::content_error(&err))?;
            }
        }
        Ok(())
    }

    fn copy(&mut self, selector: &str, to_stdout: bool, out: &mut impl Write) -> Result<()> {
        let bookmark = self.pick(selector)?.clone();
        let span = match self.extractor.content(&bookmark, self.library.bookmarks()) {
            Ok(span) => span,
            Err(err) => {
                eprintln!("{}", render::content_error(&err));
                bail!("could not retrieve SQL for '{}'", bookmark.title());
            }
        };

        if to_stdout {
            writeln!(out, "{}", render::content(&span))?;
        } else {
            Clipboard::new()
                .copy_snippet(&span.text)
                .context("failed to copy SQL to clipboard")?;
            writeln!(out, "Copied '{}' to the clipboard.", bookmark.title())?;
        }

        let count = self.usage.increment(&bookmark.id);
        self.usage.save()?;
        self.library.set_count(&bookmark.id, count);
        if let Err(err) = self.actions.record(&bookmark, COPY_ACTION, count) {
            tracing::warn!(error = %err, "failed to record bookmark action");
        }
        Ok(())
    }

    /// Copy the stored reference itself. Usage counts are left alone.
    fn copy_url(&self, selector: &str, to_stdout: bool, out: &mut impl Write) -> Result<()> {
        let bookmark = self.pick(selector)?;
        if bookmark.url.is_empty() || bookmark.is_pre_resolved() {
            bail!("'{}' has no file URL", bookmark.title());
        }

        if to_stdout {
            writeln!(out, "{}", bookmark.url)?;
        } else {
            Clipboard::new()
                .copy_snippet(&bookmark.url)
                .context("failed to copy URL to clipboard")?;
            writeln!(out, "Copied URL of '{}' to the clipboard.", bookmark.title())?;
        }
        tracing::info!(url = %bookmark.url, "copied bookmark url");
        Ok(())
    }

    fn resolve(&self, reference: &str, out: &mut impl Write) -> Result<()> {
        let context = self.extractor.context();
        match resolve::resolve(reference, context) {
            Some(path) => writeln!(out, "{}", path.display())?,
            None => {
                writeln!(out, "unresolved: {}", resolve::normalize_reference(reference, context))?;
                writeln!(out, "File not found, check the root directory setting.")?;
            }
        }
        Ok(())
    }

    /// Find a bookmark by id, or else by its rank in the default listing (`3` or `#3`).
    fn pick(&self, selector: &str) -> Result<&Bookmark> {
        if let Some(bookmark) = self.library.find(selector) {
            return Ok(bookmark);
        }

        if let Ok(rank) = selector.trim().trim_start_matches('#').parse::<usize>() {
            let ordered = pipeline::select(self.library.bookmarks(), &Query::default(), &self.extractor);
            return rank
                .checked_sub(1)
                .and_then(|index| ordered.get(index).copied())
                .with_context(|| format!("no bookmark at position {rank} ({} loaded)", ordered.len()));
        }

        bail!("no bookmark with id '{selector}'")
    }
}
