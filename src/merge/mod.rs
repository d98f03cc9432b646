//! Command merge engine.
//!
//! [`registry`] owns the JSON document holding the `scripts` mapping and the
//! non-destructive [`registry::ensure_entry`]. [`hook`] folds commands into
//! composite `&&` hooks without duplicating what is already there.
pub mod hook;
pub mod registry;

pub use hook::{
    Runner, ci_guard, guarded_hook, merge_composite, runner_patterns, validate_script_name,
};
pub use registry::{EntryStatus, RegistryDocument, ensure_entry};
