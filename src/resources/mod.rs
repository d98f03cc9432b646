//! Idempotent resource primitives (check + apply pattern).
//!
//! Each resource compares a desired piece of project state against what is
//! on disk ([`Resource::current_state`]) and can write the desired state
//! ([`Resource::apply`]). The reconciliation planner decides *whether* to
//! apply; resources only know *how*.
pub mod block;
pub mod helpers;
pub mod template;

use crate::error::Result;

/// State of a resource relative to its desired content.
///
/// # Examples
///
/// ```
/// use repo_bootstrap::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "stale block".into() };
/// let manual = ResourceState::Invalid { reason: "end marker before start".into() };
///
/// assert_ne!(missing, correct);
/// assert_eq!(correct, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist or is not present.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// Short description of what is there now.
        current: String,
    },
    /// Resource cannot be applied safely and needs a human.
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was left alone (e.g. its markers are malformed).
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}

/// Unified interface for resources that can be checked and applied.
///
/// # Examples
///
/// ```ignore
/// if matches!(resource.current_state()?, ResourceState::Missing) {
///     resource.apply()?;
/// }
/// ```
pub trait Resource {
    /// Human-readable description of this resource (usually a relative path).
    fn description(&self) -> String;

    /// Noun used in report details, e.g. `"Target file"`.
    fn label(&self) -> &'static str;

    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the desired content is unavailable (e.g. the
    /// template is missing) or the current state cannot be read.
    fn current_state(&self) -> Result<ResourceState>;

    /// Write the desired state.
    ///
    /// Creates parent directories as needed. Must not be called for
    /// resources in the [`ResourceState::Correct`] state by callers that
    /// promise no redundant writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be written.
    fn apply(&self) -> Result<ResourceChange>;
}

/// Normalise text for comparison: CRLF becomes LF and trailing whitespace
/// is trimmed.
///
/// # Examples
///
/// ```
/// use repo_bootstrap::resources::normalize;
///
/// assert_eq!(normalize("a\r\nb\r\n\r\n"), "a\nb");
/// assert_eq!(normalize("a\nb"), normalize("a\nb  \n"));
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}
