//! Composite hook merging, runner detection and CI guard selection.
//!
//! Matching is heuristic: a command counts as present when its exact text,
//! or one of the equivalent runner invocations, appears bounded by
//! whitespace, a shell separator, or the ends of the hook string.
use std::fmt;
use std::path::Path;

use regex::Regex;

use super::registry::RegistryDocument;
use crate::error::{BootstrapError, Result};

/// Characters that end a token in a shell command line.
const BOUNDARY: &str = r"[\s;&|()]";

/// Helper package used as the CI guard when the project depends on it.
pub const IS_CI: &str = "is-ci";

/// Fallback CI guard when `is-ci` is not a dependency.
pub const CI_ENV_GUARD: &str = r#"[ -n "$CI" ]"#;

/// Package script runner used to invoke a script from a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    /// `pnpm run <name>`
    Pnpm,
    /// `npm run <name>`
    Npm,
    /// `yarn <name>`
    Yarn,
    /// `bun run <name>`
    Bun,
}

impl Runner {
    const LOCKFILES: [(&'static str, Self); 3] = [
        ("pnpm-lock.yaml", Self::Pnpm),
        ("yarn.lock", Self::Yarn),
        ("bun.lockb", Self::Bun),
    ];

    /// Pick a runner from the `packageManager` field (e.g. `pnpm@9.1.0`),
    /// then from lockfiles in `root`, falling back to npm.
    #[must_use]
    pub fn detect(root: &Path, document: &RegistryDocument) -> Self {
        if let Some(runner) = document
            .string_field("packageManager")
            .and_then(|spec| Self::from_manager(spec.split('@').next().unwrap_or_default()))
        {
            return runner;
        }
        Self::LOCKFILES
            .iter()
            .find(|(lockfile, _)| root.join(lockfile).exists())
            .map_or(Self::Npm, |(_, runner)| *runner)
    }

    fn from_manager(name: &str) -> Option<Self> {
        match name {
            "pnpm" => Some(Self::Pnpm),
            "npm" => Some(Self::Npm),
            "yarn" => Some(Self::Yarn),
            "bun" => Some(Self::Bun),
            _ => None,
        }
    }

    /// Command prefix, e.g. `"pnpm run"`.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm run",
            Self::Npm => "npm run",
            Self::Yarn => "yarn",
            Self::Bun => "bun run",
        }
    }

    /// Full invocation of `script`.
    #[must_use]
    pub fn invocation(self, script: &str) -> String {
        format!("{} {script}", self.prefix())
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Reject script names that would be unsafe to embed in a shell command.
///
/// # Errors
///
/// Returns [`BootstrapError::Validation`] unless `name` is non-empty and made
/// only of ASCII letters, digits, `:`, `.`, `_` or `-`.
pub fn validate_script_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BootstrapError::Validation("script name cannot be empty".to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-'))
    {
        return Err(BootstrapError::Validation(format!(
            "invalid script name {name:?}; allowed pattern: [A-Za-z0-9:._-]+"
        )));
    }
    Ok(())
}

fn bounded(body: &str) -> Result<Regex> {
    Regex::new(&format!("(?:^|{BOUNDARY}){body}(?:$|{BOUNDARY})"))
        .map_err(|e| BootstrapError::Validation(format!("invalid invocation pattern: {e}")))
}

/// Patterns matching any runner invoking `script`.
///
/// # Errors
///
/// Returns [`BootstrapError::Validation`] if a pattern cannot be compiled.
pub fn runner_patterns(script: &str) -> Result<Vec<Regex>> {
    let name = regex::escape(script);
    [
        format!(r"pnpm\s+run\s+{name}"),
        format!(r"npm\s+run\s+{name}"),
        format!(r"yarn\s+{name}"),
        format!(r"bun\s+run\s+{name}"),
    ]
    .iter()
    .map(|body| bounded(body))
    .collect()
}

/// Whether `command` appears in `hook` as a whole token sequence.
#[must_use]
pub fn contains_invocation(hook: &str, command: &str) -> bool {
    let command = command.trim();
    if command.is_empty() {
        return false;
    }
    let is_boundary = |c: char| c.is_whitespace() || ";&|()".contains(c);
    hook.match_indices(command).any(|(at, _)| {
        let before_ok = hook
            .get(..at)
            .and_then(|s| s.chars().next_back())
            .is_none_or(is_boundary);
        let after_ok = hook
            .get(at + command.len()..)
            .and_then(|s| s.chars().next())
            .is_none_or(is_boundary);
        before_ok && after_ok
    })
}

/// Fold `command` into the composite `current` hook.
///
/// Returns `command` when there is no hook yet, `current` unchanged when
/// the command (or an equivalent matched by `patterns`) is already present,
/// and `"{current} && {command}"` otherwise.
#[must_use]
pub fn merge_composite(current: Option<&str>, command: &str, patterns: &[Regex]) -> String {
    let Some(current) = current.filter(|c| !c.trim().is_empty()) else {
        return command.to_string();
    };
    if contains_invocation(current, command) || patterns.iter().any(|p| p.is_match(current)) {
        return current.to_string();
    }
    format!("{current} && {command}")
}

/// Choose the CI guard for `document`.
#[must_use]
pub fn ci_guard(document: &RegistryDocument) -> &'static str {
    if document.has_dependency(IS_CI) {
        IS_CI
    } else {
        CI_ENV_GUARD
    }
}

/// Compose `guard && echo '<skip>' || <commands>`.
///
/// Several commands are chained with `&&` inside a subshell so the guard
/// applies to all of them.
#[must_use]
pub fn guarded_hook(guard: &str, skip_message: &str, commands: &[String]) -> String {
    let skip = skip_message.replace('\'', r"'\''");
    let body = match commands {
        [single] => single.clone(),
        many => format!("({})", many.join(" && ")),
    };
    format!("{guard} && echo '{skip}' || {body}")
}
