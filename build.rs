// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=PHOTOBOOTH_VERSION");

    // Packagers can pin the version without a git checkout
    let version = std::env::var("PHOTOBOOTH_VERSION").unwrap_or_else(|_| build_version());
    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// "<crate version>+g<short hash>", or just the crate version outside git
fn build_version() -> String {
    let base = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());

    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());

    match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if dirty => format!("{}+g{}.dirty", base, hash),
        Some(hash) => format!("{}+g{}", base, hash),
        None => base,
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
