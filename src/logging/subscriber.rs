//! Tracing subscriber setup: console formatter and initialisation.
use tracing_subscriber::EnvFilter;

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "repo_bootstrap::stage";

/// Target used for dry-run messages.
pub(super) const DRY_RUN_TARGET: &str = "repo_bootstrap::dry_run";

/// Environment variable holding an `EnvFilter` directive that overrides the
/// console level (e.g. `REPO_BOOTSTRAP_LOG=debug`).
pub const LOG_ENV: &str = "REPO_BOOTSTRAP_LOG";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// Render one console line for an event.
fn render_line(level: tracing::Level, target: &str, msg: &str) -> String {
    match level {
        tracing::Level::ERROR => format!("\x1b[31mERROR\x1b[0m {msg}"),
        tracing::Level::WARN => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        tracing::Level::INFO if target == STAGE_TARGET => {
            format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
        }
        tracing::Level::INFO if target == DRY_RUN_TARGET => {
            format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}")
        }
        tracing::Level::INFO => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] producing `==>`-style console
/// output.
struct BootstrapFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for BootstrapFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        writeln!(
            writer,
            "{}",
            render_line(*metadata.level(), metadata.target(), &extractor.message)
        )
    }
}

/// Build the console filter: `REPO_BOOTSTRAP_LOG` when set and valid,
/// otherwise `debug` for verbose runs and `info` for normal ones.
fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    })
}

/// Initialise the global [`tracing`] subscriber.
///
/// Warnings and errors go to stderr, everything else to stdout.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(BootstrapFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter(verbose));

    // A second init (e.g. from a test harness) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn stage_lines_use_arrow() {
        let line = render_line(tracing::Level::INFO, STAGE_TARGET, "Syncing skills");
        assert!(line.contains("==>"));
        assert!(line.contains("Syncing skills"));
    }

    #[test]
    fn dry_run_lines_are_tagged() {
        let line = render_line(tracing::Level::INFO, DRY_RUN_TARGET, "would sync 3 skills");
        assert!(line.contains("[DRY RUN]"));
    }

    #[test]
    fn plain_info_is_indented() {
        assert_eq!(render_line(tracing::Level::INFO, "other", "hi"), "  hi");
    }

    #[test]
    fn warn_and_error_are_labelled() {
        assert!(render_line(tracing::Level::WARN, "x", "m").contains("WARN"));
        assert!(render_line(tracing::Level::ERROR, "x", "m").contains("ERROR"));
    }

    #[test]
    fn debug_is_dimmed() {
        let line = render_line(tracing::Level::DEBUG, "x", "detail");
        assert!(line.starts_with("  \x1b[2m"));
    }
}
