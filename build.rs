//! Build script: embeds version information at compile time.

use std::process::Command;

fn main() {
    // Release builds export REPO_BOOTSTRAP_VERSION; local builds describe HEAD.
    if let Ok(version) = std::env::var("REPO_BOOTSTRAP_VERSION") {
        println!("cargo:rustc-env=REPO_BOOTSTRAP_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=REPO_BOOTSTRAP_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=REPO_BOOTSTRAP_VERSION");
}
