//! Repository bootstrap engine.
//!
//! Keeps a project's agent tooling in a known state: skills directories are
//! replaced atomically from a single source, rule templates and an ignore
//! file block are reconciled in audit or apply mode, and `package.json`
//! scripts gain the hooks they need without clobbering user content.
//!
//! The public API is organised into layers:
//!
//! - **[`swap`]** with **[`operations`]**: crash-safe directory replacement
//! - **[`resources`]** and **[`reconcile`]**: `check + apply` primitives and
//!   the audit/apply planner built on them
//! - **[`merge`]**: registry document handling and composite hook merging
//! - **[`report`]**: grouped summary of everything a run observed
//! - **[`commands`]**: top-level subcommand orchestration (`sync-skills`,
//!   `rules`, `hook`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod operations;
pub mod reconcile;
pub mod report;
pub mod resources;
pub mod swap;
