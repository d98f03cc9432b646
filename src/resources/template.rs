//! Template file resource.
use std::path::PathBuf;

use super::helpers::fs::{ensure_parent_dir, read_optional, write_terminated};
use super::{Resource, ResourceChange, ResourceState, normalize};
use crate::error::{BootstrapError, Result};

/// A target file whose content should match a template file.
#[derive(Debug, Clone)]
pub struct TemplateFileResource {
    /// Path relative to both roots, used for reporting.
    pub relative: PathBuf,
    /// Template file (e.g. `templates/.ruler/AGENTS.md`).
    pub source: PathBuf,
    /// Target file (e.g. `repo/.ruler/AGENTS.md`).
    pub target: PathBuf,
}

impl TemplateFileResource {
    /// Create a resource for `relative` under the two roots.
    #[must_use]
    pub fn new(
        templates_root: &std::path::Path,
        target_root: &std::path::Path,
        relative: PathBuf,
    ) -> Self {
        Self {
            source: templates_root.join(&relative),
            target: target_root.join(&relative),
            relative,
        }
    }

    fn template_text(&self) -> Result<String> {
        read_optional(&self.source)?.ok_or_else(|| {
            BootstrapError::NotFound(format!("template {}", self.source.display()))
        })
    }
}

impl Resource for TemplateFileResource {
    fn description(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    fn label(&self) -> &'static str {
        "Target file"
    }

    fn current_state(&self) -> Result<ResourceState> {
        let template = self.template_text()?;
        let Some(current) = read_optional(&self.target)? else {
            return Ok(ResourceState::Missing);
        };
        if normalize(&current) == normalize(&template) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        let template = self.template_text()?;
        ensure_parent_dir(&self.target)?;
        write_terminated(&self.target, &template)?;
        Ok(ResourceChange::Applied)
    }
}
