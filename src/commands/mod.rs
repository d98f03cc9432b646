//! Top-level subcommand orchestration.
pub mod hook;
pub mod rules;
pub mod sync_skills;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::GlobalOpts;
use crate::config::{CONFIG_FILE, Config};
use crate::error::BootstrapError;
use crate::logging::Log;

/// Shared state produced by the common command setup sequence.
///
/// Resolves the project root and loads `bootstrap.toml` so each command
/// does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Canonical project root.
    pub root: PathBuf,
    /// Loaded (or default) configuration.
    pub config: Config,
}

impl CommandSetup {
    /// Resolve the root and load configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not an existing directory or the
    /// configuration file fails to parse or validate.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let root = resolve_root(global)?;
        log.debug(&format!("root: {}", root.display()));

        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));
        if config_path.exists() {
            log.debug(&format!("config: {}", config_path.display()));
        } else {
            log.debug(&format!("config: {} (absent, using defaults)", config_path.display()));
        }
        let config = Config::load(&config_path)?;

        Ok(Self { root, config })
    }

    /// Render `path` relative to the root for log and report lines.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        relative_display(&self.root, path)
    }
}

/// Resolve the project root: `--root`, else the current directory.
///
/// # Errors
///
/// Returns an error if the directory does not exist or is not a directory.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    if !root.is_dir() {
        return Err(BootstrapError::Validation(format!(
            "project root is not a directory: {}",
            root.display()
        ))
        .into());
    }
    dunce::canonicalize(&root).with_context(|| format!("cannot resolve {}", root.display()))
}

/// `path` relative to `root` with `/` separators, or as given when outside it.
#[must_use]
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
