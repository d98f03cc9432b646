//! Core logging types: the [`Log`] trait, captured messages, and warn-once
//! deduplication.
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Mutex;

/// Kind of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Stage header (major section).
    Stage,
    /// Informational message.
    Info,
    /// Debug message.
    Debug,
    /// Warning.
    Warn,
    /// Error.
    Error,
    /// Action that would have been taken without `--dry-run`.
    DryRun,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to `tracing`;
/// [`MemoryLog`] keeps messages in memory so callers (and tests) can inspect
/// what a command reported.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}

/// In-memory [`Log`] implementation.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<(LogKind, String)>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: LogKind, msg: &str) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push((kind, msg.to_string()));
        }
    }

    /// Snapshot of every message logged so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(LogKind, String)> {
        self.messages.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Messages of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: LogKind) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m)
            .collect()
    }

    /// Whether any message of `kind` contains `needle`.
    #[must_use]
    pub fn contains(&self, kind: LogKind, needle: &str) -> bool {
        self.of_kind(kind).iter().any(|m| m.contains(needle))
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(LogKind::Stage, msg);
    }
    fn info(&self, msg: &str) {
        self.push(LogKind::Info, msg);
    }
    fn debug(&self, msg: &str) {
        self.push(LogKind::Debug, msg);
    }
    fn warn(&self, msg: &str) {
        self.push(LogKind::Warn, msg);
    }
    fn error(&self, msg: &str) {
        self.push(LogKind::Error, msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push(LogKind::DryRun, msg);
    }
}

/// Warn-once state owned by a single command run.
///
/// Repeated conditions (e.g. leftovers recovered on every target) are
/// reported once per key; later occurrences go to `debug`.
#[derive(Debug, Default)]
pub struct OnceLog {
    seen: RefCell<HashSet<String>>,
}

impl OnceLog {
    /// Create empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warn about `key` the first time; demote repeats to debug.
    ///
    /// Returns `true` when the warning was emitted.
    pub fn warn(&self, log: &dyn Log, key: &str, msg: &str) -> bool {
        if self.seen.borrow_mut().insert(key.to_string()) {
            log.warn(msg);
            true
        } else {
            log.debug(msg);
            false
        }
    }
}
