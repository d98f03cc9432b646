//! Hook command: register the skills sync script and chain it into
//! `postinstall`.
use anyhow::{Context, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, HookOpts};
use crate::error::BootstrapError;
use crate::logging::Log;
use crate::merge::registry::POSTINSTALL;
use crate::merge::{
    EntryStatus, RegistryDocument, Runner, ensure_entry, merge_composite, runner_patterns,
    validate_script_name,
};

/// Run the hook command.
///
/// A script name given on the command line is validated before anything
/// is read from disk.
///
/// # Errors
///
/// Returns an error if the script name is invalid, `package.json` is
/// missing or malformed, or it cannot be written.
pub fn run(global: &GlobalOpts, opts: &HookOpts, log: &dyn Log) -> Result<()> {
    if let Some(name) = &opts.script_name {
        validate_script_name(name)?;
    }

    let setup = CommandSetup::init(global, log)?;
    let script_name = opts
        .script_name
        .clone()
        .unwrap_or_else(|| setup.config.hook.script_name.clone());
    let command = opts
        .command
        .clone()
        .unwrap_or_else(|| setup.config.hook.command.clone());
    if command.trim().is_empty() {
        return Err(BootstrapError::Validation("script command cannot be empty".to_string()).into());
    }

    log.stage("Registering sync hook");
    let path = setup.root.join("package.json");
    let mut doc = RegistryDocument::load(&path)?;

    match ensure_entry(doc.scripts_mut()?, &script_name, &command) {
        EntryStatus::Created => log.info(&format!("set script: {script_name} = \"{command}\"")),
        EntryStatus::Ok => log.info(&format!("kept script: {script_name}")),
        EntryStatus::Manual => log.warn(&format!(
            "scripts.{script_name} already holds a different command; left unchanged"
        )),
    }

    if opts.skip_postinstall {
        log.info("postinstall update skipped");
    } else {
        let runner = Runner::detect(&setup.root, &doc);
        log.debug(&format!("runner: {runner}"));
        let invocation = runner.invocation(&script_name);
        let patterns = runner_patterns(&script_name)?;
        let current = doc.script(POSTINSTALL).map(str::to_string);
        let merged = merge_composite(current.as_deref(), &invocation, &patterns);
        if current.as_deref() == Some(merged.as_str()) {
            log.info(&format!("kept postinstall hook for {script_name}"));
        } else {
            doc.set_script(POSTINSTALL, &merged)?;
            log.info(&format!("merged postinstall hook for {script_name}"));
        }
    }

    if doc
        .save()
        .with_context(|| format!("writing {}", path.display()))?
    {
        log.info(&format!("updated {}", setup.display(&path)));
    } else {
        log.info(&format!("{} already up to date", setup.display(&path)));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{LogKind, MemoryLog};

    fn global(dir: &std::path::Path) -> GlobalOpts {
        GlobalOpts {
            root: Some(dir.to_path_buf()),
            config: None,
        }
    }

    #[test]
    fn invalid_name_fails_before_reading_anything() {
        let opts = HookOpts {
            script_name: Some("a;b".to_string()),
            ..HookOpts::default()
        };
        let missing = GlobalOpts {
            root: Some(std::path::PathBuf::from("/definitely/not/here")),
            config: None,
        };
        let err = run(&missing, &opts, &MemoryLog::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootstrapError>(),
            Some(BootstrapError::Validation(_))
        ));
    }

    #[test]
    fn differing_script_is_kept_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"scripts": {"skills:sync:llm": "custom"}}"#).unwrap();
        let log = MemoryLog::new();
        run(&global(dir.path()), &HookOpts::default(), &log).unwrap();

        let doc = RegistryDocument::load(&path).unwrap();
        assert_eq!(doc.script("skills:sync:llm"), Some("custom"));
        assert_eq!(doc.script("postinstall"), Some("npm run skills:sync:llm"));
        assert!(log.contains(LogKind::Warn, "left unchanged"));
    }

    #[test]
    fn skip_postinstall_leaves_hook_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"scripts": {"postinstall": "husky"}}"#).unwrap();
        let opts = HookOpts {
            skip_postinstall: true,
            ..HookOpts::default()
        };
        run(&global(dir.path()), &opts, &MemoryLog::new()).unwrap();
        let doc = RegistryDocument::load(&path).unwrap();
        assert_eq!(doc.script("postinstall"), Some("husky"));
        assert_eq!(
            doc.script("skills:sync:llm"),
            Some("repo-bootstrap sync-skills")
        );
    }
}
