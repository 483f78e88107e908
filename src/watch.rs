//! File watcher: runs `scan` on startup, then re-runs on markup changes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use bundlegroups::config::Config;
use bundlegroups::discover;
use bundlegroups::error::Error;
use bundlegroups::types::GroupLimit;
use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, OutputFormat};

/// Debounce delay between filesystem events and re-scan.
const DEBOUNCE_MS: u64 = 100;

/// The root plus every directory holding a discovered markup file.
fn collect_watch_dirs(root: &Path, config: &Config) -> HashSet<PathBuf> {
    let mut dirs = HashSet::new();
    dirs.insert(root.to_path_buf());
    for relative in discover::discover(root, config) {
        if let Some(parent) = relative.parent() {
            dirs.insert(root.join(parent));
        }
    }
    return dirs;
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(tx: crossbeam_channel::Sender<()>) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial scan, then watches markup directories and re-scans on changes.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run(limit: Option<GroupLimit>, format: OutputFormat) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");

    eprintln!("watch: initial scan");
    let mut last_code = run_scan(limit, format);

    let config = Config::load(&root)?;
    let watch_dirs = collect_watch_dirs(&root, &config);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    for dir in &watch_dirs {
        if dir.exists() {
            let _ = watcher.watch(dir, RecursiveMode::NonRecursive);
        }
    }

    let dir_count = watch_dirs.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-scanning...");
        last_code = run_scan(limit, format);
    }

    return Ok(last_code);
}

/// Run scan once and print the result.
fn run_scan(limit: Option<GroupLimit>, format: OutputFormat) -> ExitCode {
    return match commands::scan(&[], limit, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            crate::diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
