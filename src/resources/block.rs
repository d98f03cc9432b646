//! Managed block resource.
//!
//! A managed block is a span of a text file delimited by a start marker line
//! and an end marker line. Only the lines between the markers are owned by
//! this tool; everything else in the file belongs to the user.
use std::ops::Range;
use std::path::PathBuf;

use super::helpers::fs::{ensure_parent_dir, read_optional};
use super::{Resource, ResourceChange, ResourceState, normalize};
use crate::error::{BootstrapError, Result};

/// Marker pair plus the body lines that belong between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlock {
    /// Start marker line (matched byte-for-byte).
    pub start: String,
    /// End marker line (matched byte-for-byte).
    pub end: String,
    /// Lines owned by the block.
    pub body: Vec<String>,
}

/// Where a block sits inside some text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLocation {
    /// Neither marker is present.
    Absent,
    /// Only one marker is present, or the end precedes the start.
    Malformed(String),
    /// Both markers are present in order.
    Present {
        /// Byte span from the start of the start-marker line to the end of
        /// the end-marker line (terminator excluded).
        outer: Range<usize>,
        /// Byte span of the body lines, terminators included.
        inner: Range<usize>,
    },
}

impl ManagedBlock {
    /// Build a block, rejecting empty or multi-line markers.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Validation`] if a marker is empty, contains a
    /// line break, or both markers are equal.
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        body: Vec<String>,
    ) -> Result<Self> {
        let start = start.into();
        let end = end.into();
        for marker in [&start, &end] {
            if marker.trim().is_empty() || marker.contains(['\n', '\r']) {
                return Err(BootstrapError::Validation(format!(
                    "block marker must be a single non-empty line: {marker:?}"
                )));
            }
        }
        if start == end {
            return Err(BootstrapError::Validation(
                "block start and end markers must differ".to_string(),
            ));
        }
        Ok(Self { start, end, body })
    }

    /// Render the block with `\n` line terminators and no trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with("\n")
    }

    fn render_with(&self, eol: &str) -> String {
        let mut lines = Vec::with_capacity(self.body.len() + 2);
        lines.push(self.start.as_str());
        lines.extend(self.body.iter().map(String::as_str));
        lines.push(self.end.as_str());
        lines.join(eol)
    }

    /// Find the markers in `content`.
    #[must_use]
    pub fn locate(&self, content: &str) -> BlockLocation {
        let mut start: Option<(usize, usize)> = None;
        let mut end: Option<(usize, usize)> = None;
        let mut offset = 0;
        for raw in content.split_inclusive('\n') {
            let line = raw.trim_end_matches('\n').trim_end_matches('\r');
            let bounds = (offset, offset + raw.len());
            if start.is_none() && line == self.start {
                start = Some(bounds);
            } else if end.is_none() && line == self.end {
                end = Some(bounds);
            }
            offset += raw.len();
        }

        match (start, end) {
            (None, None) => BlockLocation::Absent,
            (Some(_), None) => {
                BlockLocation::Malformed(format!("found {} without {}", self.start, self.end))
            }
            (None, Some(_)) => {
                BlockLocation::Malformed(format!("found {} without {}", self.end, self.start))
            }
            (Some(s), Some(e)) if e.0 < s.0 => {
                BlockLocation::Malformed(format!("{} appears before {}", self.end, self.start))
            }
            (Some(s), Some(e)) => {
                let end_line = content.get(e.0..e.1).unwrap_or_default();
                let terminator = end_line.len()
                    - end_line
                        .trim_end_matches('\n')
                        .trim_end_matches('\r')
                        .len();
                BlockLocation::Present {
                    outer: s.0..e.1 - terminator,
                    inner: s.1..e.0,
                }
            }
        }
    }

    /// Replace the body between existing markers, leaving the text outside
    /// the markers byte-for-byte intact. Returns `None` unless both markers
    /// are present in order.
    #[must_use]
    pub fn replace_in(&self, content: &str) -> Option<String> {
        let BlockLocation::Present { inner, .. } = self.locate(content) else {
            return None;
        };
        let eol = line_ending(content);
        let mut body = String::new();
        for line in &self.body {
            body.push_str(line);
            body.push_str(eol);
        }
        let mut out = String::with_capacity(content.len() + body.len());
        out.push_str(content.get(..inner.start)?);
        out.push_str(&body);
        out.push_str(content.get(inner.end..)?);
        Some(out)
    }

    /// Append the block after `content`, separated by one blank line.
    #[must_use]
    pub fn append_to(&self, content: &str) -> String {
        let eol = line_ending(content);
        let base = content.trim_end();
        let block = self.render_with(eol);
        if base.is_empty() {
            format!("{block}{eol}")
        } else {
            format!("{base}{eol}{eol}{block}{eol}")
        }
    }

    /// Whether the block in `content` matches the desired block after
    /// normalisation.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        match self.locate(content) {
            BlockLocation::Present { outer, .. } => content
                .get(outer)
                .is_some_and(|current| normalize(current) == normalize(&self.render())),
            _ => false,
        }
    }
}

fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

/// A managed block inside a specific file.
#[derive(Debug, Clone)]
pub struct ManagedBlockResource {
    /// Path used for reporting (e.g. `.gitignore`).
    pub relative: PathBuf,
    /// Absolute file path.
    pub path: PathBuf,
    /// Desired block.
    pub block: ManagedBlock,
}

impl ManagedBlockResource {
    /// Create a resource for `block` inside `root/relative`.
    #[must_use]
    pub fn new(root: &std::path::Path, relative: PathBuf, block: ManagedBlock) -> Self {
        Self {
            path: root.join(&relative),
            relative,
            block,
        }
    }
}

impl Resource for ManagedBlockResource {
    fn description(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    fn label(&self) -> &'static str {
        "Managed block"
    }

    fn current_state(&self) -> Result<ResourceState> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(ResourceState::Missing);
        };
        match self.block.locate(&content) {
            BlockLocation::Absent => Ok(ResourceState::Missing),
            BlockLocation::Malformed(reason) => Ok(ResourceState::Invalid { reason }),
            BlockLocation::Present { .. } if self.block.matches(&content) => {
                Ok(ResourceState::Correct)
            }
            BlockLocation::Present { .. } => Ok(ResourceState::Incorrect {
                current: "block content differs".to_string(),
            }),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        let content = read_optional(&self.path)?;
        let updated = match content.as_deref() {
            None => format!("{}\n", self.block.render()),
            Some(text) => match self.block.locate(text) {
                BlockLocation::Absent => self.block.append_to(text),
                BlockLocation::Malformed(reason) => return Ok(ResourceChange::Skipped { reason }),
                BlockLocation::Present { .. } if self.block.matches(text) => {
                    return Ok(ResourceChange::AlreadyCorrect);
                }
                BlockLocation::Present { .. } => match self.block.replace_in(text) {
                    Some(replaced) => replaced,
                    None => return Ok(ResourceChange::AlreadyCorrect),
                },
            },
        };
        ensure_parent_dir(&self.path)?;
        std::fs::write(&self.path, updated).map_err(|e| BootstrapError::io(&self.path, e))?;
        Ok(ResourceChange::Applied)
    }
}
