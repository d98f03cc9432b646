//! Optional `bootstrap.toml` configuration.
//!
//! Every field has a default, so a project without the file behaves exactly
//! like one with an empty file.
pub mod toml_loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BootstrapError;
use crate::merge::validate_script_name;
use crate::resources::block::ManagedBlock;

/// Default config file name, resolved against the project root.
pub const CONFIG_FILE: &str = "bootstrap.toml";

/// Default command registered under `ruler:apply`.
pub const RULER_APPLY_COMMAND: &str =
    "pnpm dlx @intellectronica/ruler@latest apply --local-only --no-backup";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `[skills]` section.
    pub skills: SkillsConfig,
    /// `[rules]` section.
    pub rules: RulesConfig,
    /// `[hook]` section.
    pub hook: HookConfig,
}

/// Skills directory sync settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsConfig {
    /// Source directory, relative to the project root.
    pub source: PathBuf,
    /// Targets synced when `--targets` is not given.
    pub default_targets: Vec<String>,
    /// Target name to destination directory (relative to the root).
    pub targets: BTreeMap<String, PathBuf>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(".agents/skills"),
            default_targets: vec!["claude".to_string(), "codex".to_string()],
            targets: BTreeMap::from([
                ("claude".to_string(), PathBuf::from(".claude/skills")),
                ("codex".to_string(), PathBuf::from(".codex/skills")),
            ]),
        }
    }
}

/// Rule template reconciliation settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Templates root; overridden by `--templates` and `REPO_BOOTSTRAP_TEMPLATES`.
    pub templates_dir: Option<PathBuf>,
    /// Template files, relative to both the templates root and the project.
    pub templates: Vec<PathBuf>,
    /// Command stored as `scripts.ruler:apply`.
    pub apply_command: String,
    /// Command stored as `scripts.skills:sync:claude` with `--with-optional-sync`.
    pub sync_command: String,
    /// Managed block in the ignore file.
    pub ignore: IgnoreConfig,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            templates_dir: None,
            templates: [
                ".ruler/AGENTS.md",
                ".ruler/00-core-principles.md",
                ".ruler/10-project-context.md",
                ".ruler/20-dev-commands.md",
                ".ruler/30-coding-conventions.md",
                ".ruler/ruler.toml",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            apply_command: RULER_APPLY_COMMAND.to_string(),
            sync_command: "repo-bootstrap sync-skills --targets claude".to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

/// Ignore-file managed block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreConfig {
    /// File holding the block, relative to the project root.
    pub file: PathBuf,
    /// Start marker line.
    pub start: String,
    /// End marker line.
    pub end: String,
    /// Lines between the markers.
    pub entries: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(".gitignore"),
            start: "# START Ruler Generated Files".to_string(),
            end: "# END Ruler Generated Files".to_string(),
            entries: vec![
                "/.codex/config.toml".to_string(),
                "/AGENTS.md".to_string(),
                "/CLAUDE.md".to_string(),
            ],
        }
    }
}

impl IgnoreConfig {
    /// Build the managed block described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Validation`] for unusable markers.
    pub fn block(&self) -> crate::error::Result<ManagedBlock> {
        ManagedBlock::new(self.start.clone(), self.end.clone(), self.entries.clone())
    }
}

/// `hook` command defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HookConfig {
    /// Script name registered in `scripts`.
    pub script_name: String,
    /// Command stored under that script name.
    pub command: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            script_name: "skills:sync:llm".to_string(),
            command: "repo-bootstrap sync-skills".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (missing file means defaults) and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = toml_loader::load_config(path)?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Check names and markers before anything touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Validation`] describing the first problem.
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_script_name(&self.hook.script_name)?;
        self.rules.ignore.block()?;
        for name in self.skills.targets.keys() {
            let valid = name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if name.is_empty() || !valid {
                return Err(BootstrapError::Validation(format!(
                    "invalid skills target name {name:?}"
                )));
            }
        }
        for name in &self.skills.default_targets {
            if !self.skills.targets.contains_key(name) {
                return Err(BootstrapError::Validation(format!(
                    "default target {name:?} is not defined in [skills.targets]"
                )));
            }
        }
        Ok(())
    }
}
