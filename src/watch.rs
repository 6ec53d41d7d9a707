//! File watcher: runs `check` on startup, then re-runs on changes.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, Format};
use crate::error;
use crate::git_root::GitRootLocator;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(tx: crossbeam_channel::Sender<()>) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
        {
            log::debug!("watch event: {:?}", event.paths);
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches `paths` (default `.`) recursively.
/// Each batch of changes clears the git-root cache before re-checking, since
/// a `.git` entry may have appeared or disappeared.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be set up.
pub fn run(paths: &[PathBuf], format: Format) -> Result<ExitCode, error::Error> {
    eprintln!("watch: initial check");
    let mut last_code = run_check(paths, format);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    let default_roots = [PathBuf::from(".")];
    let roots = if paths.is_empty() { &default_roots[..] } else { paths };
    for root in roots {
        watcher.watch(root, RecursiveMode::Recursive).map_err(|e| error::Error::WatchFailed {
            reason: format!("cannot watch {}: {e}", root.display()),
        })?;
    }

    eprintln!("watch: monitoring {} paths, press Ctrl+C to stop", roots.len());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-checking...");
        GitRootLocator::shared().clear();
        last_code = run_check(paths, format);
    }

    return Ok(last_code);
}

/// Run check once and print result. Returns the exit code from check.
fn run_check(paths: &[PathBuf], format: Format) -> ExitCode {
    return match commands::check(paths, format) {
        Ok(code) => code,
        Err(e) => {
            crate::diagnostics::print_error(&e);
            ExitCode::from(3_u8)
        },
    };
}
