//! Atomic directory replacement.
//!
//! [`swap`] replaces the full content of a target directory with a copy of a
//! source directory. The copy is staged in a sibling `<target>.__tmp__`
//! directory and cut over with renames, so an observer sees either the old
//! tree or the new tree and never a half-populated one:
//!
//! ```text
//! source ──copy──▶ target.__tmp__
//! target ──rename─▶ target.__bak__      (only when target exists)
//! target.__tmp__ ──rename─▶ target
//! target.__bak__ ──remove
//! ```
//!
//! Two swaps against the same target must not run concurrently: they share
//! the staging and backup names.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result, SwapError};
use crate::operations::{FileSystemOps, SystemFileSystemOps};

const STAGING_SUFFIX: &str = ".__tmp__";
const BACKUP_SUFFIX: &str = ".__bak__";

/// What a successful swap observed besides the cutover itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Staging or backup leftovers from an interrupted run were removed.
    pub recovered_stale: bool,
    /// The previous content could not be deleted after the cutover; it is
    /// still at this path and will be removed by the next swap.
    pub backup_left: Option<PathBuf>,
}

/// Staging and backup siblings of a swap target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPaths {
    /// Directory being replaced.
    pub target: PathBuf,
    /// Where the new content is assembled before cutover.
    pub staging: PathBuf,
    /// Where the previous content waits until the cutover is confirmed.
    pub backup: PathBuf,
}

impl SwapPaths {
    /// Derive the staging and backup paths for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Validation`] if `target` has no final
    /// component (e.g. `/` or `..`).
    pub fn for_target(target: &Path) -> Result<Self> {
        let name = target.file_name().ok_or_else(|| {
            BootstrapError::Validation(format!(
                "swap target has no directory name: {}",
                target.display()
            ))
        })?;
        Ok(Self {
            target: target.to_path_buf(),
            staging: target.with_file_name(suffixed(name, STAGING_SUFFIX)),
            backup: target.with_file_name(suffixed(name, BACKUP_SUFFIX)),
        })
    }
}

fn suffixed(name: &std::ffi::OsStr, suffix: &str) -> OsString {
    let mut out = name.to_os_string();
    out.push(suffix);
    out
}

/// Replace `target`'s content with a recursive copy of `source`.
///
/// # Errors
///
/// - [`BootstrapError::NotFound`] if `source` is not a directory (nothing is touched).
/// - [`BootstrapError::Validation`] if `target` has no final path component.
/// - [`BootstrapError::Swap`] if staging, copying, or cutover fails; `target`
///   then holds exactly what it held before the call (or is still absent).
pub fn swap(source: &Path, target: &Path) -> Result<SwapOutcome> {
    swap_with(&SystemFileSystemOps, source, target)
}

/// [`swap`] against an explicit [`FileSystemOps`] implementation.
///
/// # Errors
///
/// See [`swap`].
pub fn swap_with(ops: &dyn FileSystemOps, source: &Path, target: &Path) -> Result<SwapOutcome> {
    if !ops.is_dir(source) {
        return Err(BootstrapError::NotFound(format!(
            "source directory: {}",
            source.display()
        )));
    }
    let paths = SwapPaths::for_target(target)?;
    let mut outcome = SwapOutcome::default();

    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        ops.create_dir_all(parent).map_err(|source| SwapError::Prepare {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    for stale in [&paths.staging, &paths.backup] {
        if ops.exists(stale) {
            ops.remove_all(stale).map_err(|source| SwapError::Prepare {
                path: stale.clone(),
                source,
            })?;
            outcome.recovered_stale = true;
        }
    }

    if let Err(source_err) = ops.copy_tree(source, &paths.staging) {
        ops.remove_all(&paths.staging).ok(); // Best effort; next run cleans up
        return Err(SwapError::Copy {
            from: source.to_path_buf(),
            to: paths.staging,
            source: source_err,
        }
        .into());
    }

    let had_target = ops.exists(target);
    if let Err(err) = cut_over(ops, &paths, had_target) {
        roll_back(ops, &paths);
        return Err(err.into());
    }

    if had_target && ops.remove_all(&paths.backup).is_err() {
        outcome.backup_left = Some(paths.backup);
    }

    Ok(outcome)
}

fn cut_over(
    ops: &dyn FileSystemOps,
    paths: &SwapPaths,
    had_target: bool,
) -> std::result::Result<(), SwapError> {
    if had_target {
        ops.rename(&paths.target, &paths.backup)
            .map_err(|source| SwapError::Move {
                from: paths.target.clone(),
                to: paths.backup.clone(),
                source,
            })?;
    }
    ops.rename(&paths.staging, &paths.target)
        .map_err(|source| SwapError::Move {
            from: paths.staging.clone(),
            to: paths.target.clone(),
            source,
        })
}

/// Best-effort restore after a failed cutover. The caller reports the
/// original error, so failures here are not surfaced.
fn roll_back(ops: &dyn FileSystemOps, paths: &SwapPaths) {
    ops.remove_all(&paths.staging).ok();
    if !ops.exists(&paths.target) && ops.exists(&paths.backup) {
        ops.rename(&paths.backup, &paths.target).ok();
    }
}

/// Count the immediate subdirectories of `dir`.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn count_subdirectories(dir: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(dir).map_err(|e| BootstrapError::io(dir, e))?;
    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|e| BootstrapError::io(dir, e))?;
        if entry.path().is_dir() {
            count += 1;
        }
    }
    Ok(count)
}
