//! Rules command: reconcile rule templates, the ignore-file block and the
//! package scripts, then print the summary.
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, RulesOpts};
use crate::config::RulesConfig;
use crate::error::BootstrapError;
use crate::logging::Log;
use crate::merge::hook::contains_invocation;
use crate::merge::registry::POSTINSTALL;
use crate::merge::{
    EntryStatus, RegistryDocument, Runner, ci_guard, ensure_entry, guarded_hook, merge_composite,
    runner_patterns,
};
use crate::reconcile::{Mode, Status, reconcile, reconcile_region};
use crate::report::Reporter;

/// Environment variable overriding the templates directory.
pub const TEMPLATES_ENV: &str = "REPO_BOOTSTRAP_TEMPLATES";

/// Script that applies the rules.
pub const APPLY_SCRIPT: &str = "ruler:apply";

/// Optional script that syncs skills for Claude.
pub const SYNC_SCRIPT: &str = "skills:sync:claude";

const PACKAGE_SECTION: &str = "package.json";

/// Pick the templates root: flag, then environment, then config, then
/// `<root>/.ruler-templates`. Relative paths resolve against `root`.
#[must_use]
pub fn resolve_templates_root(
    root: &Path,
    flag: Option<&Path>,
    env: Option<PathBuf>,
    config: &RulesConfig,
) -> PathBuf {
    let chosen = flag
        .map(Path::to_path_buf)
        .or(env)
        .or_else(|| config.templates_dir.clone())
        .unwrap_or_else(|| PathBuf::from(".ruler-templates"));
    root.join(chosen)
}

/// Run the rules command.
///
/// # Errors
///
/// Returns an error if setup fails or any item ended in `error`.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &RulesOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let rules = &setup.config.rules;
    let block = rules.ignore.block()?;
    let env = std::env::var_os(TEMPLATES_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let templates_root = resolve_templates_root(&setup.root, opts.templates.as_deref(), env, rules);

    log.stage(&format!("Reconciling rules ({})", opts.mode));
    log.info(&format!("target: {}", setup.root.display()));
    log.info(&format!("templates: {}", templates_root.display()));
    log.debug(&format!(
        "optional sync: {}, force: {}",
        enabled(opts.with_optional_sync),
        enabled(opts.force)
    ));
    if opts.force && opts.mode == Mode::Audit {
        log.warn("--force has no effect in audit mode");
    }

    let mut reporter = Reporter::new();
    reporter.extend(
        "Templates",
        reconcile(
            &templates_root,
            &setup.root,
            &rules.templates,
            opts.mode,
            opts.force,
        ),
    );
    let ignore_section = setup.display(&setup.root.join(&rules.ignore.file));
    reporter.extend(
        &ignore_section,
        reconcile_region(
            &setup.root,
            &rules.ignore.file,
            &block,
            opts.mode,
            opts.force,
        ),
    );
    reconcile_scripts(&setup.root, rules, opts, &mut reporter, log);

    println!("{}", reporter.summarize(opts.mode));

    let errors = reporter.error_count();
    if errors > 0 {
        anyhow::bail!("{errors} item(s) could not be reconciled");
    }
    Ok(())
}

const fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

/// Reconcile `scripts` in `package.json`. Problems become report entries.
pub fn reconcile_scripts(
    root: &Path,
    rules: &RulesConfig,
    opts: &RulesOpts,
    reporter: &mut Reporter,
    log: &dyn Log,
) {
    let path = root.join(PACKAGE_SECTION);
    let mut doc = match RegistryDocument::load(&path) {
        Ok(doc) => doc,
        Err(BootstrapError::NotFound(_)) => {
            reporter.add(
                PACKAGE_SECTION,
                Status::Manual,
                PACKAGE_SECTION,
                "File not found, skipped",
            );
            return;
        }
        Err(e) => {
            reporter.add(
                PACKAGE_SECTION,
                Status::Error,
                PACKAGE_SECTION,
                e.to_string(),
            );
            return;
        }
    };

    if let Err(e) = update_scripts(root, &mut doc, rules, opts, reporter) {
        reporter.add(
            PACKAGE_SECTION,
            Status::Error,
            PACKAGE_SECTION,
            e.to_string(),
        );
        return;
    }

    if opts.mode == Mode::Apply {
        match doc.save() {
            Ok(true) => log.info(&format!("updated {}", doc.path().display())),
            Ok(false) => log.debug("package.json unchanged"),
            Err(e) => reporter.add(
                PACKAGE_SECTION,
                Status::Error,
                PACKAGE_SECTION,
                e.to_string(),
            ),
        }
    }
}

fn update_scripts(
    root: &Path,
    doc: &mut RegistryDocument,
    rules: &RulesConfig,
    opts: &RulesOpts,
    reporter: &mut Reporter,
) -> crate::error::Result<()> {
    let mut required = vec![(APPLY_SCRIPT, rules.apply_command.as_str())];
    if opts.with_optional_sync {
        required.push((SYNC_SCRIPT, rules.sync_command.as_str()));
    }

    for (key, value) in &required {
        let status = ensure_entry(doc.scripts_mut()?, key, value);
        let (status, detail) = match (status, opts.mode) {
            (EntryStatus::Created, Mode::Audit) => (Status::Missing, "Script is missing"),
            (EntryStatus::Created, Mode::Apply) => (Status::Created, "Added missing script"),
            (EntryStatus::Ok, _) => (Status::Ok, "Already matches recommendation"),
            (EntryStatus::Manual, _) => (Status::Manual, "Existing value kept"),
        };
        reporter.add(PACKAGE_SECTION, status, &format!("scripts.{key}"), detail);
    }

    let runner = Runner::detect(root, doc);
    let guard = ci_guard(doc);
    let target = format!("scripts.{POSTINSTALL}");
    let current = doc
        .script(POSTINSTALL)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    match current {
        None => {
            let keys: Vec<&str> = required.iter().map(|(key, _)| *key).collect();
            doc.set_script(POSTINSTALL, &desired_hook(runner, guard, &keys))?;
            let (status, detail) = match opts.mode {
                Mode::Audit => (
                    Status::Missing,
                    format!("No postinstall; would add one ({guard} guard)"),
                ),
                Mode::Apply => (
                    Status::Created,
                    format!("Added recommended postinstall ({guard} guard)"),
                ),
            };
            reporter.add(PACKAGE_SECTION, status, &target, detail);
        }
        Some(current) => {
            let mut missing = Vec::new();
            for (key, _) in &required {
                let present = contains_invocation(&current, &runner.invocation(key))
                    || runner_patterns(key)?.iter().any(|p| p.is_match(&current));
                if !present {
                    missing.push(*key);
                }
            }
            let (status, detail) =
                reconcile_existing_hook(doc, &current, runner, guard, &required, &missing, opts)?;
            reporter.add(PACKAGE_SECTION, status, &target, detail);
        }
    }

    if doc.has_dependency(crate::merge::hook::IS_CI) {
        reporter.add(
            PACKAGE_SECTION,
            Status::Ok,
            "is-ci",
            "Detected dependency; postinstall uses the `is-ci` guard",
        );
    } else {
        reporter.add(
            PACKAGE_SECTION,
            Status::Manual,
            "is-ci",
            "Not detected; add it as a dev dependency to use the `is-ci` guard",
        );
    }
    Ok(())
}

/// Decide what happens to an existing, non-empty `postinstall`.
///
/// Without `--force` only the commands in `missing` are appended, so a
/// command the hook already runs is never chained a second time.
fn reconcile_existing_hook(
    doc: &mut RegistryDocument,
    current: &str,
    runner: Runner,
    guard: &str,
    required: &[(&str, &str)],
    missing: &[&str],
    opts: &RulesOpts,
) -> crate::error::Result<(Status, String)> {
    if missing.is_empty() {
        return Ok((Status::Ok, "Contains required command(s)".to_string()));
    }
    let outcome = match (opts.mode, opts.force) {
        (Mode::Apply, true) => {
            let keys: Vec<&str> = required.iter().map(|(key, _)| *key).collect();
            doc.set_script(POSTINSTALL, &desired_hook(runner, guard, &keys))?;
            (
                Status::Overwritten,
                format!("Replaced with recommended command ({guard} guard) due to --force"),
            )
        }
        (Mode::Apply, false) => {
            let block = format!("({})", desired_hook(runner, guard, missing));
            doc.set_script(POSTINSTALL, &merge_composite(Some(current), &block, &[]))?;
            (
                Status::Updated,
                format!(
                    "Appended CI-guarded {} ({guard} guard), existing steps kept",
                    missing.join(", ")
                ),
            )
        }
        (Mode::Audit, _) => (
            Status::Differs,
            format!("Existing postinstall lacks {}", missing.join(", ")),
        ),
    };
    Ok(outcome)
}

/// Guarded hook running `keys` in order, with a skip message naming them.
fn desired_hook(runner: Runner, guard: &str, keys: &[&str]) -> String {
    let labels: Vec<&str> = keys
        .iter()
        .map(|key| if *key == SYNC_SCRIPT { "skills sync" } else { *key })
        .collect();
    let skip_message = format!("Skipping {} in CI environment", labels.join(" and "));
    let invocations: Vec<String> = keys.iter().map(|key| runner.invocation(key)).collect();
    guarded_hook(guard, &skip_message, &invocations)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;

    fn opts(mode: Mode, force: bool) -> RulesOpts {
        RulesOpts {
            mode,
            force,
            with_optional_sync: false,
            templates: None,
        }
    }

    fn statuses(reporter: &Reporter) -> Vec<(String, Status)> {
        reporter
            .entries()
            .iter()
            .map(|e| (e.target.clone(), e.status))
            .collect()
    }

    #[test]
    fn templates_root_precedence() {
        let root = Path::new("/repo");
        let mut config = RulesConfig::default();
        assert_eq!(
            resolve_templates_root(root, None, None, &config),
            Path::new("/repo/.ruler-templates")
        );
        config.templates_dir = Some(PathBuf::from("cfg"));
        assert_eq!(
            resolve_templates_root(root, None, None, &config),
            Path::new("/repo/cfg")
        );
        assert_eq!(
            resolve_templates_root(root, None, Some(PathBuf::from("/env")), &config),
            Path::new("/env")
        );
        assert_eq!(
            resolve_templates_root(
                root,
                Some(Path::new("flag")),
                Some(PathBuf::from("/env")),
                &config,
            ),
            Path::new("/repo/flag")
        );
    }

    #[test]
    fn missing_package_json_is_manual() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts(Mode::Apply, false),
            &mut reporter,
            &MemoryLog::new(),
        );
        assert_eq!(
            statuses(&reporter),
            vec![("package.json".to_string(), Status::Manual)]
        );
    }

    #[test]
    fn audit_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{\"name\": \"x\"}").unwrap();
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts(Mode::Audit, true),
            &mut reporter,
            &MemoryLog::new(),
        );
        assert_eq!(
            statuses(&reporter),
            vec![
                ("scripts.ruler:apply".to_string(), Status::Missing),
                ("scripts.postinstall".to_string(), Status::Missing),
                ("is-ci".to_string(), Status::Manual),
            ]
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"name\": \"x\"}");
    }

    #[test]
    fn apply_creates_guarded_postinstall() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"devDependencies": {"is-ci": "^3"}}"#).unwrap();
        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts(Mode::Apply, false),
            &mut reporter,
            &MemoryLog::new(),
        );
        let doc = RegistryDocument::load(&path).unwrap();
        assert_eq!(
            doc.script("postinstall"),
            Some("is-ci && echo 'Skipping ruler:apply in CI environment' || pnpm run ruler:apply")
        );
        assert_eq!(
            doc.script("ruler:apply"),
            Some(crate::config::RULER_APPLY_COMMAND)
        );
        assert!(reporter.entries().iter().all(|e| e.status != Status::Manual));
    }

    #[test]
    fn apply_appends_to_foreign_postinstall_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"scripts": {"postinstall": "husky install"}}"#).unwrap();
        let run = || {
            let mut reporter = Reporter::new();
            reconcile_scripts(
                dir.path(),
                &RulesConfig::default(),
                &opts(Mode::Apply, false),
                &mut reporter,
                &MemoryLog::new(),
            );
            reporter
        };

        let first = run();
        assert!(statuses(&first).contains(&("scripts.postinstall".to_string(), Status::Updated)));
        let hook = RegistryDocument::load(&path)
            .unwrap()
            .script("postinstall")
            .unwrap()
            .to_string();
        assert!(hook.starts_with("husky install && ([ -n \"$CI\" ] && echo"));
        assert!(hook.ends_with("|| npm run ruler:apply)"));

        let second = run();
        assert!(statuses(&second).contains(&("scripts.postinstall".to_string(), Status::Ok)));
        assert_eq!(
            RegistryDocument::load(&path).unwrap().script("postinstall"),
            Some(hook.as_str())
        );
    }

    #[test]
    fn force_replaces_foreign_postinstall() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"scripts": {"postinstall": "husky install"}}"#).unwrap();
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts(Mode::Apply, true),
            &mut reporter,
            &MemoryLog::new(),
        );
        assert!(
            statuses(&reporter)
                .contains(&("scripts.postinstall".to_string(), Status::Overwritten))
        );
        let doc = RegistryDocument::load(&path).unwrap();
        assert!(!doc.script("postinstall").unwrap().contains("husky"));
    }

    #[test]
    fn schema_error_is_reported_and_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let raw = r#"{"scripts": "nope"}"#;
        std::fs::write(&path, raw).unwrap();
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts(Mode::Apply, true),
            &mut reporter,
            &MemoryLog::new(),
        );
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
    }

    fn reconcile_partial(with_optional_sync: bool) -> (Reporter, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let raw = r#"{"scripts": {"postinstall": "pnpm run ruler:apply"}}"#;
        std::fs::write(&path, raw).unwrap();
        let opts = RulesOpts {
            with_optional_sync,
            ..opts(Mode::Apply, false)
        };
        let mut reporter = Reporter::new();
        reconcile_scripts(
            dir.path(),
            &RulesConfig::default(),
            &opts,
            &mut reporter,
            &MemoryLog::new(),
        );
        let hook = RegistryDocument::load(&path)
            .unwrap()
            .script("postinstall")
            .unwrap()
            .to_string();
        (reporter, hook)
    }

    #[test]
    fn present_command_is_not_chained_twice() {
        let (reporter, hook) = reconcile_partial(false);
        assert_eq!(hook, "pnpm run ruler:apply");
        let expected = ("scripts.postinstall".to_string(), Status::Ok);
        assert!(statuses(&reporter).contains(&expected));
    }

    #[test]
    fn partial_hook_gains_only_missing_commands() {
        let (reporter, hook) = reconcile_partial(true);
        assert_eq!(hook.matches("ruler:apply").count(), 1, "{hook}");
        assert_eq!(
            hook,
            "pnpm run ruler:apply && ([ -n \"$CI\" ] && echo 'Skipping skills sync in CI environment' || npm run skills:sync:claude)"
        );
        let expected = ("scripts.postinstall".to_string(), Status::Updated);
        assert!(statuses(&reporter).contains(&expected));
    }

    #[test]
    fn partial_hook_is_stable_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let raw = r#"{"scripts": {"postinstall": "npm run skills:sync:claude"}}"#;
        std::fs::write(&path, raw).unwrap();
        let opts = RulesOpts {
            with_optional_sync: true,
            ..opts(Mode::Apply, false)
        };
        let run = || {
            let mut reporter = Reporter::new();
            reconcile_scripts(
                dir.path(),
                &RulesConfig::default(),
                &opts,
                &mut reporter,
                &MemoryLog::new(),
            );
            std::fs::read_to_string(&path).unwrap()
        };
        let first = run();
        assert!(first.contains("Skipping ruler:apply in CI environment"));
        assert_eq!(first.matches("skills:sync:claude").count(), 2);
        assert_eq!(run(), first);
    }
}
