use std::path::Path;
use std::time::Duration;

use crate::cleaner::{CleanupItem, Payload, SizedPath};
use crate::command::CommandRunner;
use crate::errors::Result;
use crate::interrupt::Interrupt;
use crate::oplog::OperationLog;
use crate::utils;

const PACCACHE_TIMEOUT: Duration = Duration::from_secs(120);
const PACMAN_REMOVE_TIMEOUT: Duration = Duration::from_secs(120);
const JOURNAL_VACUUM_TIMEOUT: Duration = Duration::from_secs(60);
const ROOT_REMOVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, PartialEq)]
pub struct ExecutionReport {
    pub succeeded: usize,
    pub failed: usize,
    pub estimated_freed: u64,
}

/// Applies the deletion routine for each selected item, in order.
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    log: &'a OperationLog,
    interrupt: &'a Interrupt,
}

/// Remove each path, carrying on past failures. True if all went.
fn remove_all<'p>(paths: impl IntoIterator<Item = &'p Path>) -> bool {
    let mut failed = 0usize;
    for path in paths {
        if let Err(e) = utils::safe_remove(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not remove");
            failed += 1;
        }
    }
    failed == 0
}

fn remove_sized(entries: &[SizedPath]) -> bool {
    remove_all(entries.iter().map(|e| e.path.as_path()))
}

impl<'a> Executor<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        log: &'a OperationLog,
        interrupt: &'a Interrupt,
    ) -> Self {
        Self {
            runner,
            log,
            interrupt,
        }
    }

    /// Clean every item. `on_item` sees each outcome as it happens.
    ///
    /// A failed item never stops the run; an interrupt does, between items.
    pub fn run(
        &self,
        items: &[CleanupItem],
        mut on_item: impl FnMut(&CleanupItem, bool),
    ) -> Result<ExecutionReport> {
        self.log.record("Cleanup started");
        let mut report = ExecutionReport::default();

        for item in items {
            self.interrupt.check()?;

            let ok = self.clean_item(item);
            let marker = if ok { "✓" } else { "✗" };
            self.log.record(&format!("{marker} {}", item.description));
            on_item(item, ok);

            if ok {
                report.succeeded += 1;
                report.estimated_freed += item.estimated_bytes;
            } else {
                report.failed += 1;
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "cleanup finished"
        );
        Ok(report)
    }

    /// Run the routine matching the item's payload.
    pub fn clean_item(&self, item: &CleanupItem) -> bool {
        tracing::debug!(category = item.category().name(), "cleaning item");
        match &item.payload {
            Payload::PackageCache {
                archives,
                keep_versions,
            } => self.prune_package_cache(archives, *keep_versions),
            Payload::PackageTempDownloads { dirs } => remove_all(dirs.iter().map(|d| d.as_path())),
            Payload::OrphanedPackages { packages } => {
                let mut args = vec!["-Rns", "--noconfirm"];
                args.extend(packages.iter().map(|p| p.name.as_str()));
                self.privileged("pacman", &args, PACMAN_REMOVE_TIMEOUT)
            }
            Payload::JournalLogs { retain_days } => {
                let vacuum = format!("--vacuum-time={retain_days}d");
                self.privileged("journalctl", &[vacuum.as_str()], JOURNAL_VACUUM_TIMEOUT)
            }
            Payload::UserCacheDir { dirs } => remove_sized(dirs),
            Payload::BuildCache { caches } => remove_all(caches.iter().map(|c| c.path.as_path())),
            Payload::BrokenSymlinks { links } => remove_all(links.iter().map(|l| l.as_path())),
            Payload::StaleConfigFiles { files } => self.remove_as_root(files),
            Payload::DuplicateFiles { files } => remove_all(files.iter().map(|f| f.path.as_path())),
            Payload::OrphanedConfigDirs { dirs } => self.remove_as_root(dirs),
            Payload::Trash { dir } => empty_trash(dir),
            Payload::Thumbnails { dir } => recreate_empty(dir),
            Payload::StaleTempFiles { files } => remove_sized(files),
        }
    }

    fn privileged(&self, program: &str, args: &[&str], timeout: Duration) -> bool {
        match self.runner.run_privileged_checked(program, args, timeout) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(program, error = %e, "command failed");
                false
            }
        }
    }

    /// Entries under `/etc` belong to root, so they go through `rm` with the
    /// usual privilege prefix.
    fn remove_as_root(&self, entries: &[SizedPath]) -> bool {
        if entries.is_empty() {
            return true;
        }
        let paths: Vec<String> = entries
            .iter()
            .map(|e| e.path.to_string_lossy().into_owned())
            .collect();
        let mut args = vec!["-rf", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.privileged("rm", &args, ROOT_REMOVE_TIMEOUT)
    }

    /// `paccache` knows about installed versions, so prefer it; fall back to
    /// deleting the archives the scan picked.
    fn prune_package_cache(&self, archives: &[SizedPath], keep: usize) -> bool {
        if !self.runner.is_available("paccache") {
            tracing::info!("paccache not found, removing archives directly");
            return remove_sized(archives);
        }
        let keep_arg = format!("-rk{keep}");
        let kept = self.privileged("paccache", &[keep_arg.as_str()], PACCACHE_TIMEOUT);
        // Every cached version of uninstalled packages.
        let uninstalled = self.privileged("paccache", &["-ruk0"], PACCACHE_TIMEOUT);
        kept && uninstalled
    }
}

fn empty_trash(dir: &Path) -> bool {
    let mut ok = true;
    for sub in ["files", "info"] {
        match utils::empty_dir(&dir.join(sub)) {
            Ok(0) => {}
            Ok(failed) => {
                tracing::warn!(dir = %dir.join(sub).display(), failed, "trash entries left behind");
                ok = false;
            }
            Err(e) => {
                tracing::warn!(dir = %dir.join(sub).display(), error = %e, "could not empty trash");
                ok = false;
            }
        }
    }
    ok
}

fn recreate_empty(dir: &Path) -> bool {
    if let Err(e) = utils::safe_remove(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "could not remove");
        return false;
    }
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not recreate");
            false
        }
    }
}
