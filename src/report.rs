//! Append-only report aggregation and summary rendering.
use std::fmt::Write as _;

use crate::reconcile::{Mode, ReconciliationItem, Status};

/// One summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Group heading (e.g. `Templates`, `package.json`).
    pub section: String,
    /// Recorded status.
    pub status: Status,
    /// What the entry is about (path or `scripts.<key>`).
    pub target: String,
    /// Free-form explanation.
    pub detail: String,
}

/// Collects [`ReportEntry`] records in arrival order.
///
/// Rendering groups entries by section, keeping sections in the order they
/// were first seen. The reporter never decides exit codes.
#[derive(Debug, Default, Clone)]
pub struct Reporter {
    entries: Vec<ReportEntry>,
}

impl Reporter {
    /// Create an empty reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record one entry.
    pub fn add(
        &mut self,
        section: &str,
        status: impl Into<Status>,
        target: &str,
        detail: impl Into<String>,
    ) {
        self.entries.push(ReportEntry {
            section: section.to_string(),
            status: status.into(),
            target: target.to_string(),
            detail: detail.into(),
        });
    }

    /// Record every planner item under `section`.
    pub fn extend(&mut self, section: &str, items: impl IntoIterator<Item = ReconciliationItem>) {
        for item in items {
            self.add(section, item.status, &item.path, item.detail);
        }
    }

    /// Recorded entries in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Whether any entry is `manual` or `differs`.
    #[must_use]
    pub fn needs_follow_up(&self) -> bool {
        self.entries.iter().any(|e| e.status.needs_follow_up())
    }

    /// Number of `error` entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status == Status::Error).count()
    }

    /// Render the grouped summary.
    #[must_use]
    pub fn summarize(&self, mode: Mode) -> String {
        let mut sections: Vec<(&str, Vec<&ReportEntry>)> = Vec::new();
        for entry in &self.entries {
            match sections.iter_mut().find(|(name, _)| *name == entry.section) {
                Some((_, group)) => group.push(entry),
                None => sections.push((&entry.section, vec![entry])),
            }
        }

        let mut out = String::from("\nSummary\n-------\n");
        for (section, group) in sections {
            let _ = writeln!(out, "{section}");
            for e in group {
                let _ = writeln!(out, "- [{}] {} :: {}", e.status, e.target, e.detail);
            }
        }
        if self.needs_follow_up() {
            out.push_str("\nManual follow-up required for some items.\n");
        }
        if mode == Mode::Audit {
            out.push_str("\nNext: run with --mode apply to create missing files.\n");
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sample() -> Reporter {
        let mut r = Reporter::new();
        r.extend(
            "Templates",
            vec![ReconciliationItem {
                path: ".ruler/AGENTS.md".to_string(),
                status: Status::Missing,
                detail: "Target file is missing".to_string(),
            }],
        );
        r.add(".gitignore", Status::Ok, ".gitignore", "Up to date");
        r.add("Templates", Status::Differs, ".ruler/ruler.toml", "Target file: content differs");
        r
    }

    #[test]
    fn groups_by_first_seen_section_in_audit() {
        insta::assert_snapshot!(sample().summarize(Mode::Audit).trim_start(), @r"
        Summary
        -------
        Templates
        - [missing] .ruler/AGENTS.md :: Target file is missing
        - [differs] .ruler/ruler.toml :: Target file: content differs
        .gitignore
        - [ok] .gitignore :: Up to date

        Manual follow-up required for some items.

        Next: run with --mode apply to create missing files.
        ");
    }

    #[test]
    fn apply_summary_has_no_hint() {
        let mut r = Reporter::new();
        r.add("package.json", Status::Created, "scripts.ruler:apply", "Added missing script");
        insta::assert_snapshot!(r.summarize(Mode::Apply).trim_start(), @r"
        Summary
        -------
        package.json
        - [created] scripts.ruler:apply :: Added missing script
        ");
    }

    #[test]
    fn summary_starts_with_blank_line() {
        assert!(Reporter::new().summarize(Mode::Apply).starts_with("\nSummary\n-------\n"));
    }

    #[test]
    fn follow_up_and_error_counts() {
        let mut r = sample();
        assert!(r.needs_follow_up());
        assert_eq!(r.error_count(), 0);
        r.add("Templates", Status::Error, "x", "boom");
        assert_eq!(r.error_count(), 1);
        assert_eq!(r.entries().len(), 4);

        let mut clean = Reporter::new();
        clean.add("s", Status::Overwritten, "t", "d");
        assert!(!clean.needs_follow_up());
    }
}
