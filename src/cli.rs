//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::reconcile::Mode;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "repo-bootstrap",
    about = "Keep agent skills, rule templates and install hooks in sync",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/bootstrap.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace each skills target directory with a copy of the source
    SyncSkills(SyncSkillsOpts),
    /// Audit or apply rule templates, the ignore block and package scripts
    Rules(RulesOpts),
    /// Register the skills sync script and merge it into postinstall
    Hook(HookOpts),
    /// Print version information
    Version,
}

/// Options for the `sync-skills` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct SyncSkillsOpts {
    /// Source skills directory, relative to the root
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Comma-separated targets (e.g. claude,codex)
    #[arg(long, value_delimiter = ',')]
    pub targets: Option<Vec<String>>,

    /// Report what would be synced without touching the filesystem
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

/// Options for the `rules` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RulesOpts {
    /// audit reports only; apply writes
    #[arg(long, value_enum, default_value_t = Mode::Audit)]
    pub mode: Mode,

    /// Overwrite differing files and blocks in apply mode
    #[arg(long)]
    pub force: bool,

    /// Also register the skills sync script and chain it into postinstall
    #[arg(long)]
    pub with_optional_sync: bool,

    /// Templates directory
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

/// Options for the `hook` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct HookOpts {
    /// Script name to register (letters, digits and `:._-` only)
    #[arg(long)]
    pub script_name: Option<String>,

    /// Command stored under the script name
    #[arg(long)]
    pub command: Option<String>,

    /// Leave postinstall untouched
    #[arg(long)]
    pub skip_postinstall: bool,
}
