//! Sync-skills command: swap the skills source into every selected target.
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{CommandSetup, relative_display};
use crate::cli::{GlobalOpts, SyncSkillsOpts};
use crate::config::SkillsConfig;
use crate::error::BootstrapError;
use crate::logging::{Log, OnceLog};
use crate::swap::{SwapOutcome, count_subdirectories, swap};

/// One source/destination pair for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Target name from the config map (e.g. `claude`).
    pub name: String,
    /// Skills source directory.
    pub source: PathBuf,
    /// Directory replaced by the swap.
    pub destination: PathBuf,
}

/// Resolve the requested target names against the configured map.
///
/// `requested` falls back to `default_targets`. Duplicates are dropped,
/// keeping first-seen order.
///
/// # Errors
///
/// Returns [`BootstrapError::Validation`] for an empty selection or an
/// unknown name.
pub fn resolve_targets(
    skills: &SkillsConfig,
    root: &Path,
    source: &Path,
    requested: Option<&[String]>,
) -> crate::error::Result<Vec<SyncTarget>> {
    let names = requested.unwrap_or(&skills.default_targets);
    let mut targets: Vec<SyncTarget> = Vec::new();
    for raw in names {
        let name = raw.trim();
        if name.is_empty() || targets.iter().any(|t| t.name == name) {
            continue;
        }
        let Some(destination) = skills.targets.get(name) else {
            let known: Vec<&str> = skills.targets.keys().map(String::as_str).collect();
            return Err(BootstrapError::Validation(format!(
                "unknown target {name:?} (known: {})",
                known.join(", ")
            )));
        };
        targets.push(SyncTarget {
            name: name.to_string(),
            source: source.to_path_buf(),
            destination: root.join(destination),
        });
    }
    if targets.is_empty() {
        return Err(BootstrapError::Validation("no sync targets selected".to_string()));
    }
    Ok(targets)
}

/// Run the sync-skills command.
///
/// Every target is attempted even when an earlier one fails.
///
/// # Errors
///
/// Returns an error if setup or validation fails, the source is missing, or
/// at least one target could not be synced.
pub fn run(global: &GlobalOpts, opts: &SyncSkillsOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let skills = &setup.config.skills;

    let source = setup
        .root
        .join(opts.source.as_ref().unwrap_or(&skills.source));
    let targets = resolve_targets(skills, &setup.root, &source, opts.targets.as_deref())?;

    if !source.is_dir() {
        return Err(BootstrapError::NotFound(format!(
            "skills source directory {}",
            source.display()
        ))
        .into());
    }
    let count = count_subdirectories(&source)?;

    log.stage("Syncing skills");
    let once = OnceLog::new();
    let mut failed: Vec<&str> = Vec::new();

    for target in &targets {
        let route = format!(
            "({} -> {})",
            setup.display(&target.source),
            setup.display(&target.destination)
        );

        if opts.dry_run {
            log.dry_run(&format!("would sync {count} skills to {} {route}", target.name));
            continue;
        }

        match swap(&target.source, &target.destination) {
            Ok(outcome) => {
                note_leftovers(&outcome, &setup.root, &once, log);
                log.info(&format!("synced {count} skills to {} {route}", target.name));
            }
            Err(e) => {
                log.error(&format!("failed to sync {}: {e}", target.name));
                failed.push(&target.name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} target(s) failed: {}",
            failed.len(),
            targets.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

/// Warn (once per run) about leftovers a swap cleaned up or left behind.
fn note_leftovers(outcome: &SwapOutcome, root: &Path, once: &OnceLog, log: &dyn Log) {
    if outcome.recovered_stale {
        once.warn(
            log,
            "recovered-stale",
            "removed leftovers of an interrupted sync",
        );
    }
    if let Some(backup) = &outcome.backup_left {
        once.warn(
            log,
            "backup-left",
            &format!(
                "could not remove {}; the next sync will clean it up",
                relative_display(root, backup)
            ),
        );
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{LogKind, MemoryLog};

    fn names(targets: &[SyncTarget]) -> Vec<&str> {
        targets.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn defaults_cover_claude_and_codex() {
        let skills = SkillsConfig::default();
        let targets = resolve_targets(&skills, Path::new("/r"), Path::new("/r/src"), None).unwrap();
        assert_eq!(names(&targets), vec!["claude", "codex"]);
        assert_eq!(targets[0].destination, Path::new("/r/.claude/skills"));
        assert_eq!(targets[1].source, Path::new("/r/src"));
    }

    #[test]
    fn requested_targets_are_deduplicated() {
        let skills = SkillsConfig::default();
        let requested = vec![
            "codex".to_string(),
            " codex ".to_string(),
            "claude".to_string(),
        ];
        let targets =
            resolve_targets(&skills, Path::new("/r"), Path::new("/s"), Some(&requested)).unwrap();
        assert_eq!(names(&targets), vec!["codex", "claude"]);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let skills = SkillsConfig::default();
        let requested = vec!["cursor".to_string()];
        let err = resolve_targets(&skills, Path::new("/r"), Path::new("/s"), Some(&requested))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Validation(ref m) if m.contains("cursor")));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let skills = SkillsConfig::default();
        let requested = vec![String::new()];
        assert!(matches!(
            resolve_targets(&skills, Path::new("/r"), Path::new("/s"), Some(&requested)),
            Err(BootstrapError::Validation(_))
        ));
    }

    #[test]
    fn leftover_backup_is_warned_once_per_run() {
        let root = Path::new("/r");
        let outcome = SwapOutcome {
            recovered_stale: false,
            backup_left: Some(PathBuf::from("/r/.claude/skills.__bak__")),
        };
        let log = MemoryLog::new();
        let once = OnceLog::new();

        note_leftovers(&outcome, root, &once, &log);
        note_leftovers(&outcome, root, &once, &log);

        assert_eq!(
            log.of_kind(LogKind::Warn),
            vec!["could not remove .claude/skills.__bak__; the next sync will clean it up"]
        );
        assert_eq!(log.of_kind(LogKind::Debug).len(), 1);
    }

    #[test]
    fn clean_outcome_logs_nothing() {
        let log = MemoryLog::new();
        note_leftovers(
            &SwapOutcome::default(),
            Path::new("/r"),
            &OnceLog::new(),
            &log,
        );
        assert!(log.messages().is_empty());
    }
}
