//! Reconciliation planner: compare desired files and blocks against a
//! target tree, and optionally write the differences.
//!
//! Every item is processed independently. A missing template or an I/O
//! failure on one path becomes an [`Status::Error`] item and the batch
//! carries on.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::BootstrapError;
use crate::resources::block::{ManagedBlock, ManagedBlockResource};
use crate::resources::template::TemplateFileResource;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// How far the planner may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Report only; never write.
    Audit,
    /// Write missing items (and differing ones when forced).
    Apply,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audit => f.write_str("audit"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

/// Outcome recorded for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Already matches.
    Ok,
    /// Not present.
    Missing,
    /// Present with different content.
    Differs,
    /// Written because it was missing.
    Created,
    /// Extended in place (e.g. a command appended to a hook).
    Updated,
    /// Replaced because it differed and force was given.
    Overwritten,
    /// Needs a human.
    Manual,
    /// Could not be processed.
    Error,
}

impl Status {
    /// Whether this status asks the user to look at something.
    #[must_use]
    pub const fn needs_follow_up(self) -> bool {
        matches!(self, Self::Manual | Self::Differs)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::Differs => "differs",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Overwritten => "overwritten",
            Self::Manual => "manual",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One planner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationItem {
    /// Path relative to the target root, `/`-separated.
    pub path: String,
    /// What was observed or done.
    pub status: Status,
    /// Human-readable explanation.
    pub detail: String,
}

impl ReconciliationItem {
    fn new(path: &str, status: Status, detail: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// Reconcile `relative_paths` from `templates_root` into `target_root`.
///
/// Produces one item per path, or two when something was written (the
/// observed state followed by the action taken).
#[must_use]
pub fn reconcile(
    templates_root: &Path,
    target_root: &Path,
    relative_paths: &[PathBuf],
    mode: Mode,
    force: bool,
) -> Vec<ReconciliationItem> {
    relative_paths
        .iter()
        .flat_map(|relative| {
            let resource = TemplateFileResource::new(templates_root, target_root, relative.clone());
            plan(&resource, mode, force)
        })
        .collect()
}

/// Reconcile a single managed block inside `root/relative`.
#[must_use]
pub fn reconcile_region(
    root: &Path,
    relative: &Path,
    block: &ManagedBlock,
    mode: Mode,
    force: bool,
) -> Vec<ReconciliationItem> {
    let resource = ManagedBlockResource::new(root, relative.to_path_buf(), block.clone());
    plan(&resource, mode, force)
}

fn plan(resource: &dyn Resource, mode: Mode, force: bool) -> Vec<ReconciliationItem> {
    let path = resource.description();
    let label = resource.label();

    let state = match resource.current_state() {
        Ok(state) => state,
        Err(BootstrapError::NotFound(_)) => {
            return vec![ReconciliationItem::new(
                &path,
                Status::Error,
                "Template source file missing",
            )];
        }
        Err(e) => return vec![ReconciliationItem::new(&path, Status::Error, e.to_string())],
    };

    match state {
        ResourceState::Correct => vec![ReconciliationItem::new(&path, Status::Ok, "Up to date")],
        ResourceState::Invalid { reason } => {
            vec![ReconciliationItem::new(
                &path,
                Status::Manual,
                format!("{reason}; fix it by hand"),
            )]
        }
        ResourceState::Missing => {
            let mut items = vec![ReconciliationItem::new(
                &path,
                Status::Missing,
                format!("{label} is missing"),
            )];
            if mode == Mode::Apply {
                items.push(write(resource, &path, Status::Created, format!("{label} written")));
            }
            items
        }
        ResourceState::Incorrect { current } => {
            let hint = if mode == Mode::Apply && !force {
                " (re-run with --force to overwrite)"
            } else {
                ""
            };
            let mut items = vec![ReconciliationItem::new(
                &path,
                Status::Differs,
                format!("{label}: {current}{hint}"),
            )];
            if mode == Mode::Apply && force {
                items.push(write(
                    resource,
                    &path,
                    Status::Overwritten,
                    format!("{label} replaced"),
                ));
            }
            items
        }
    }
}

fn write(resource: &dyn Resource, path: &str, done: Status, detail: String) -> ReconciliationItem {
    match resource.apply() {
        Ok(ResourceChange::Applied) => ReconciliationItem::new(path, done, detail),
        Ok(ResourceChange::AlreadyCorrect) => {
            ReconciliationItem::new(path, Status::Ok, "Up to date")
        }
        Ok(ResourceChange::Skipped { reason }) => {
            ReconciliationItem::new(path, Status::Manual, reason)
        }
        Err(e) => ReconciliationItem::new(path, Status::Error, e.to_string()),
    }
}
