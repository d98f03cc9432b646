//! Domain-specific error types for the bootstrap engines.
//!
//! Engines return these typed errors; command handlers at the CLI boundary
//! convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! BootstrapError
//! ├── Validation(String)   : bad input shape or characters, before any mutation
//! ├── NotFound(String)     : required source, template, or registry file absent
//! ├── Swap(SwapError)      : directory swap failures (copy, move, prepare)
//! ├── Schema(String)       : registry document has the wrong shape
//! └── Io { path, source }  : any other filesystem failure
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the bootstrap engines.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Input rejected before any filesystem interaction.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A directory swap failed; the target was left as it was before the call.
    #[error("swap failed: {0}")]
    Swap(#[from] SwapError),

    /// The registry document does not have the expected structure.
    #[error("schema error: {0}")]
    Schema(String),

    /// An I/O error outside the swap engine.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl BootstrapError {
    /// Shorthand for an [`BootstrapError::Io`] bound to `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the atomic swap engine.
#[derive(Error, Debug)]
pub enum SwapError {
    /// Removing stale staging/backup paths or creating the target parent failed.
    #[error("failed to prepare {}: {source}", .path.display())]
    Prepare {
        /// Path being cleaned or created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Copying the source tree into the staging path failed.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        /// Source directory.
        from: PathBuf,
        /// Staging directory.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A cutover rename failed; rollback was attempted.
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        /// Path being renamed.
        from: PathBuf,
        /// Rename destination.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for the bootstrap engines.
pub type Result<T> = std::result::Result<T, BootstrapError>;

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn validation_display() {
        let e = BootstrapError::Validation("bad name".to_string());
        assert_eq!(e.to_string(), "validation error: bad name");
    }

    #[test]
    fn not_found_display() {
        let e = BootstrapError::NotFound("package.json".to_string());
        assert_eq!(e.to_string(), "not found: package.json");
    }

    #[test]
    fn schema_display() {
        let e = BootstrapError::Schema("scripts must be an object".to_string());
        assert_eq!(e.to_string(), "schema error: scripts must be an object");
    }

    #[test]
    fn io_display_includes_path() {
        let e = BootstrapError::io(
            "/repo/.gitignore",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(e.to_string().contains("/repo/.gitignore"));
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn swap_move_display() {
        let e = SwapError::Move {
            from: PathBuf::from("/a.__tmp__"),
            to: PathBuf::from("/a"),
            source: io::Error::other("busy"),
        };
        assert_eq!(e.to_string(), "failed to move /a.__tmp__ to /a: busy");
    }

    #[test]
    fn swap_error_converts_to_bootstrap_error() {
        let e: BootstrapError = SwapError::Copy {
            from: PathBuf::from("/src"),
            to: PathBuf::from("/dst.__tmp__"),
            source: io::Error::other("disk full"),
        }
        .into();
        assert!(e.to_string().starts_with("swap failed: failed to copy"));
    }

    #[test]
    fn swap_error_keeps_source() {
        use std::error::Error as StdError;
        let e = SwapError::Prepare {
            path: PathBuf::from("/dst.__bak__"),
            source: io::Error::other("busy"),
        };
        assert!(e.source().is_some());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<BootstrapError>();
        assert_send_sync::<SwapError>();
    }

    #[test]
    fn bootstrap_error_converts_to_anyhow() {
        let e = BootstrapError::NotFound("x".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
