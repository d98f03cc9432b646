//! File-system resource helpers.
use std::io;
use std::path::Path;

use crate::error::{BootstrapError, Result};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| BootstrapError::io(parent, e))?;
    }
    Ok(())
}

/// Read `path` as UTF-8, returning `None` when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BootstrapError::io(path, e)),
    }
}

/// Write `text` to `path`, appending a line terminator when it lacks one.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_terminated(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, with_trailing_newline(text)).map_err(|e| BootstrapError::io(path, e))
}

/// Return `text` with exactly the original content plus a final `\n` if missing.
#[must_use]
pub fn with_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

/// Recursively copy a directory tree.
///
/// Symlinks within the source tree are *followed*: directory symlinks are
/// recursed into and their contents materialised rather than copying the
/// link itself.
///
/// Errors carry the path that failed so a swap failure names the culprit.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst).map_err(|e| annotate(e, dst))?;
    for entry in std::fs::read_dir(src).map_err(|e| annotate(e, src))? {
        let entry = entry.map_err(|e| annotate(e, src))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).map_err(|e| annotate(e, &src_path))?;
        }
    }
    Ok(())
}

fn annotate(e: io::Error, path: &Path) -> io::Error {
    io::Error::new(e.kind(), format!("{}: {e}", path.display()))
}
