// SPDX-License-Identifier: GPL-3.0-only

//! Bundled assets and the on-disk asset cache

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Summary of one cache installation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Names of every bundled asset
pub fn names() -> Vec<String> {
    Assets::iter().map(|name| name.into_owned()).collect()
}

/// Key reference shown by the terminal UI
pub fn help_text() -> Cow<'static, str> {
    match Assets::get("help.txt") {
        Some(file) => match file.data {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        },
        None => Cow::Borrowed("h: help | q: quit"),
    }
}

/// Default cache location
pub fn cache_dir() -> PathBuf {
    crate::config::Config::cache_dir().join("assets")
}

/// Copy every bundled asset into `dir`
///
/// Files whose content already matches are left alone. Failures are logged
/// and counted, never returned.
pub fn install(dir: &Path) -> InstallReport {
    let mut report = InstallReport::default();

    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "Cannot create asset cache");
        report.failed = Assets::iter().count();
        return report;
    }

    for name in Assets::iter() {
        let Some(file) = Assets::get(&name) else {
            report.failed += 1;
            continue;
        };

        let target = dir.join(name.as_ref());
        if std::fs::read(&target).is_ok_and(|existing| existing == file.data.as_ref()) {
            report.unchanged += 1;
            continue;
        }

        let written = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(&target, file.data.as_ref()));

        match written {
            Ok(()) => {
                debug!(asset = %name, "Asset cached");
                report.written += 1;
            }
            Err(e) => {
                warn!(asset = %name, error = %e, "Failed to cache asset");
                report.failed += 1;
            }
        }
    }

    info!(
        dir = %dir.display(),
        written = report.written,
        unchanged = report.unchanged,
        failed = report.failed,
        "Asset cache installed"
    );
    report
}

/// Install the asset cache on the blocking pool without waiting for it
pub fn spawn_install(dir: PathBuf) -> tokio::task::JoinHandle<InstallReport> {
    tokio::task::spawn_blocking(move || install(&dir))
}
