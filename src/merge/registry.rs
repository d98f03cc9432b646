//! Registry document (`package.json`-style) loading, saving and
//! non-destructive script entry updates.
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{BootstrapError, Result};
use crate::reconcile::Status;

/// Key of the composite hook inside `scripts`.
pub const POSTINSTALL: &str = "postinstall";

/// Outcome of [`ensure_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// The key was absent (or empty) and has been set.
    Created,
    /// The key already held the desired value.
    Ok,
    /// The key holds a different value, which was kept.
    Manual,
}

impl From<EntryStatus> for Status {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Created => Self::Created,
            EntryStatus::Ok => Self::Ok,
            EntryStatus::Manual => Self::Manual,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Status::from(*self).fmt(f)
    }
}

/// Set `scripts[key] = value` unless the key already holds something else.
///
/// An absent key, an empty string, or `null` counts as unset. A present
/// value that differs (including a non-string) is never touched.
pub fn ensure_entry(scripts: &mut Map<String, Value>, key: &str, value: &str) -> EntryStatus {
    match scripts.get(key) {
        None | Some(Value::Null) => {}
        Some(Value::String(current)) if current.is_empty() => {}
        Some(Value::String(current)) if current == value => return EntryStatus::Ok,
        Some(_) => return EntryStatus::Manual,
    }
    scripts.insert(key.to_string(), Value::String(value.to_string()));
    EntryStatus::Created
}

/// A JSON object document with a nested `scripts` mapping.
///
/// Key order is preserved on save. The document remembers what it looked
/// like when loaded so [`RegistryDocument::save`] can skip no-op writes.
#[derive(Debug, Clone)]
pub struct RegistryDocument {
    path: PathBuf,
    root: Map<String, Value>,
    pristine: Map<String, Value>,
}

impl RegistryDocument {
    /// Load and shape-check the document at `path`.
    ///
    /// # Errors
    ///
    /// * [`BootstrapError::NotFound`] if the file does not exist.
    /// * [`BootstrapError::Schema`] if it is not valid JSON, the top level is
    ///   not an object, `scripts` is not an object, or `scripts.postinstall`
    ///   is not a string.
    /// * [`BootstrapError::Io`] for any other read failure.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BootstrapError::NotFound(format!(
                    "registry document {}",
                    path.display()
                )));
            }
            Err(e) => return Err(BootstrapError::io(path, e)),
        };
        Self::parse(path, &raw)
    }

    /// Parse `raw` as the document stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Schema`] on malformed content.
    pub fn parse(path: &Path, raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| BootstrapError::Schema(format!("{}: invalid JSON: {e}", path.display())))?;
        let Value::Object(root) = value else {
            return Err(BootstrapError::Schema(format!(
                "{}: top level must be a JSON object",
                path.display()
            )));
        };
        match root.get("scripts") {
            None | Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(BootstrapError::Schema(format!(
                    "{}: \"scripts\" must be an object",
                    path.display()
                )));
            }
        }
        if let Some(Value::Object(scripts)) = root.get("scripts")
            && let Some(hook) = scripts.get(POSTINSTALL)
            && !hook.is_string()
        {
            return Err(BootstrapError::Schema(format!(
                "{}: \"scripts.{POSTINSTALL}\" must be a string",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            pristine: root.clone(),
            root,
        })
    }

    /// Location of the document on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view of `scripts`, if present.
    #[must_use]
    pub fn scripts(&self) -> Option<&Map<String, Value>> {
        self.root.get("scripts").and_then(Value::as_object)
    }

    /// Mutable `scripts` mapping, inserted (empty) when absent.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Schema`] if `scripts` is not an object.
    pub fn scripts_mut(&mut self) -> Result<&mut Map<String, Value>> {
        let entry = self
            .root
            .entry("scripts")
            .or_insert_with(|| Value::Object(Map::new()));
        entry
            .as_object_mut()
            .ok_or_else(|| BootstrapError::Schema("\"scripts\" must be an object".to_string()))
    }

    /// Current value of `scripts[key]` when it is a string.
    #[must_use]
    pub fn script(&self, key: &str) -> Option<&str> {
        self.scripts()?.get(key)?.as_str()
    }

    /// Set `scripts[key] = value` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Schema`] if `scripts` is not an object.
    pub fn set_script(&mut self, key: &str, value: &str) -> Result<()> {
        self.scripts_mut()?
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    /// Top-level string field (e.g. `packageManager`).
    #[must_use]
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.root.get(key)?.as_str()
    }

    /// Whether `name` is listed in `dependencies` or `devDependencies`.
    #[must_use]
    pub fn has_dependency(&self, name: &str) -> bool {
        ["dependencies", "devDependencies"].iter().any(|section| {
            self.root
                .get(*section)
                .and_then(Value::as_object)
                .and_then(|deps| deps.get(name))
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
        })
    }

    /// Whether the in-memory document differs from what was loaded.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.root != self.pristine
    }

    /// Render as two-space indented JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Schema`] if serialisation fails.
    pub fn render(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.root)
            .map_err(|e| BootstrapError::Schema(format!("cannot serialise document: {e}")))?;
        text.push('\n');
        Ok(text)
    }

    /// Write the document back if it changed. Returns whether it wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn save(&mut self) -> Result<bool> {
        if !self.is_changed() {
            return Ok(false);
        }
        let text = self.render()?;
        std::fs::write(&self.path, text).map_err(|e| BootstrapError::io(&self.path, e))?;
        self.pristine = self.root.clone();
        Ok(true)
    }
}
