//! `repo-bootstrap` binary entry point.
use anyhow::Result;
use clap::Parser;

use repo_bootstrap::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = logging::Logger::new();

    let result = match &args.command {
        cli::Command::SyncSkills(opts) => commands::sync_skills::run(&args.global, opts, &log),
        cli::Command::Rules(opts) => commands::rules::run(&args.global, opts, &log),
        cli::Command::Hook(opts) => commands::hook::run(&args.global, opts, &log),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    let (warnings, errors) = (log.warning_count(), log.error_count());
    if errors > 0 {
        log.info(&format!("finished with {errors} error(s) and {warnings} warning(s)"));
    } else if result.is_ok() && warnings > 0 {
        log.info(&format!("finished with {warnings} warning(s)"));
    }
    result
}
