//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the swap engine can be
//! exercised against induced failures without a real faulty disk.
//! Production code uses [`SystemFileSystemOps`]; tests use the generated
//! `MockFileSystemOps` or a wrapper that fails selected calls.

use std::io;
use std::path::Path;

/// Abstraction over the filesystem mutations performed by a directory swap.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps: std::fmt::Debug {
    /// Returns `true` if something (file, directory, or broken symlink) is at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Create `path` and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Recursively copy the directory `from` to the new path `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be read or written.
    fn copy_tree(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Rename `from` to `to` in a single filesystem operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails (e.g. cross-device, permissions).
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove whatever is at `path`, recursively. Absent paths are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be removed.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> io::Result<()> {
        crate::resources::helpers::fs::copy_dir_recursive(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }
}
