// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project and a fluent builder so each
// integration test can set up skills, templates and a package.json without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use repo_bootstrap::cli::GlobalOpts;

/// Recursively read every file under `dir` into `relative path -> content`.
pub fn read_tree(dir: &Path) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    collect(dir, dir, &mut out);
    out
}

fn collect(base: &Path, dir: &Path, out: &mut BTreeMap<String, String>) {
    for entry in std::fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(base, &path, out);
        } else {
            let rel = path
                .strip_prefix(base)
                .expect("strip prefix")
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(rel, std::fs::read_to_string(&path).expect("read file"));
        }
    }
}

/// Names of the immediate subdirectories of `dir`, sorted.
pub fn subdirectories(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry"))
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// An isolated project backed by a [`tempfile::TempDir`].
pub struct ProjectContext {
    /// Temporary project root.
    pub root: tempfile::TempDir,
}

impl ProjectContext {
    /// Path to the project root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `rel` inside the project.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Read `rel` as a string.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read project file")
    }

    /// Write `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write project file");
    }

    /// Global options pointing at this project.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            root: Some(self.root.path().to_path_buf()),
            config: None,
        }
    }
}

/// Fluent builder for [`ProjectContext`].
pub struct ProjectBuilder {
    ctx: ProjectContext,
}

impl ProjectBuilder {
    /// Begin with an empty project directory.
    pub fn new() -> Self {
        Self {
            ctx: ProjectContext {
                root: tempfile::tempdir().expect("create temp dir"),
            },
        }
    }

    /// Add a skill directory `.agents/skills/<name>/SKILL.md`.
    pub fn with_skill(self, name: &str, body: &str) -> Self {
        self.with_file(&format!(".agents/skills/{name}/SKILL.md"), body)
    }

    /// Write a template under `.ruler-templates/`.
    pub fn with_template(self, rel: &str, content: &str) -> Self {
        self.with_file(&format!(".ruler-templates/{rel}"), content)
    }

    /// Write every default rule template with distinct content.
    pub fn with_default_templates(self) -> Self {
        [
            ".ruler/AGENTS.md",
            ".ruler/00-core-principles.md",
            ".ruler/10-project-context.md",
            ".ruler/20-dev-commands.md",
            ".ruler/30-coding-conventions.md",
            ".ruler/ruler.toml",
        ]
        .iter()
        .fold(self, |builder, rel| {
            let content = format!("# template for {rel}\n");
            builder.with_template(rel, &content)
        })
    }

    /// Write `package.json`.
    pub fn with_package_json(self, content: &str) -> Self {
        self.with_file("package.json", content)
    }

    /// Write `bootstrap.toml`.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("bootstrap.toml", content)
    }

    /// Write an arbitrary file.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        self.ctx.write(rel, content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> ProjectContext {
        self.ctx
    }
}
