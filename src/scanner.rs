use std::collections::HashSet;
use std::time::SystemTime;

use crate::categories;
use crate::cleaner::{Check, CleanupItem, ScanContext, all_category_names};
use crate::command::CommandRunner;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::interrupt::Interrupt;
use crate::packages::{PackageInventory, Pacman};
use crate::remote_index::{AurRpc, RemoteIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Running,
    Done,
}

/// Everything one scan pass produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub items: Vec<CleanupItem>,
    pub total_bytes: u64,
}

impl ScanReport {
    fn push(&mut self, item: CleanupItem) {
        self.total_bytes += item.estimated_bytes;
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolve `--only` names to checks. An empty list means every check.
pub fn select_checks(only: &[String]) -> Result<Vec<Box<dyn Check>>> {
    if only.is_empty() {
        return Ok(categories::all_checks());
    }
    for name in only {
        if categories::find_check(name).is_none() {
            return Err(Error::UnknownCategory(
                name.clone(),
                all_category_names().join(", "),
            ));
        }
    }
    Ok(categories::all_checks()
        .into_iter()
        .filter(|c| only.iter().any(|n| n == c.name()))
        .collect())
}

/// Installed packages plus the remote index, taken once before any check runs.
pub fn load_inventory(
    config: &Config,
    runner: &dyn CommandRunner,
    offline: bool,
) -> PackageInventory {
    let installed = Pacman::new(runner).installed_packages();

    let remote = if config.remote_index.enabled {
        match AurRpc::new(&config.remote_index) {
            Ok(source) => RemoteIndex::new(
                source,
                config.paths.remote_index_cache(),
                &config.remote_index,
            )
            .packages(offline),
            Err(e) => {
                tracing::warn!(error = %e, "remote index client unavailable");
                HashSet::new()
            }
        }
    } else {
        HashSet::new()
    };

    let inventory = PackageInventory::new(installed, remote);
    tracing::info!(
        installed = inventory.installed_count(),
        remote = inventory.remote_count(),
        "package inventory loaded"
    );
    inventory
}

/// Runs the checks one after another and collects what they find.
pub struct Scanner<'a> {
    checks: Vec<Box<dyn Check>>,
    interrupt: &'a Interrupt,
    phase: ScanPhase,
}

impl<'a> Scanner<'a> {
    pub fn new(checks: Vec<Box<dyn Check>>, interrupt: &'a Interrupt) -> Self {
        Self {
            checks,
            interrupt,
            phase: ScanPhase::Idle,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Run every check in order. `progress` is called before each check with
    /// its position and label.
    ///
    /// A failing check is logged and skipped. Only an interrupt stops the pass.
    pub fn run(
        &mut self,
        config: &Config,
        runner: &dyn CommandRunner,
        inventory: &PackageInventory,
        mut progress: impl FnMut(usize, &str),
    ) -> Result<ScanReport> {
        self.phase = ScanPhase::Running;
        let ctx = ScanContext {
            config,
            runner,
            inventory,
            now: SystemTime::now(),
        };

        let mut report = ScanReport::default();
        for (idx, check) in self.checks.iter().enumerate() {
            self.interrupt.check()?;
            progress(idx, check.label());

            match check.scan(&ctx) {
                Ok(Some(item)) => {
                    tracing::debug!(
                        check = check.name(),
                        bytes = item.estimated_bytes,
                        "found item"
                    );
                    report.push(item);
                }
                Ok(None) => tracing::debug!(check = check.name(), "nothing found"),
                Err(e) => tracing::warn!(check = check.name(), error = %e, "check failed"),
            }
        }

        self.phase = ScanPhase::Done;
        tracing::info!(
            items = report.items.len(),
            total_bytes = report.total_bytes,
            "scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{Category, Payload};
    use crate::command::fake::FakeRunner;

    struct Fails;

    impl Check for Fails {
        fn category(&self) -> Category {
            Category::JournalLogs
        }

        fn scan(&self, _ctx: &ScanContext) -> Result<Option<CleanupItem>> {
            Err(Error::CommandMissing {
                program: "journalctl".to_string(),
            })
        }
    }

    struct Finds(u64);

    impl Check for Finds {
        fn category(&self) -> Category {
            Category::Trash
        }

        fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
            let dir = ctx.config.paths.trash.clone();
            Ok(Some(CleanupItem::new(
                Some(dir.clone()),
                self.0,
                "Trash bin",
                Payload::Trash { dir },
            )))
        }
    }

    fn config() -> Config {
        Config::for_root(std::path::Path::new("/nonexistent"))
    }

    #[test]
    fn failing_check_does_not_stop_the_sequence() {
        let interrupt = Interrupt::new();
        let checks: Vec<Box<dyn Check>> =
            vec![Box::new(Finds(10)), Box::new(Fails), Box::new(Finds(5))];
        let mut scanner = Scanner::new(checks, &interrupt);
        assert_eq!(scanner.phase(), ScanPhase::Idle);

        let mut seen = Vec::new();
        let report = scanner
            .run(
                &config(),
                &FakeRunner::new(),
                &PackageInventory::default(),
                |i, _| seen.push(i),
            )
            .unwrap();

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.total_bytes, 15);
        assert_eq!(scanner.phase(), ScanPhase::Done);
    }

    #[test]
    fn interrupt_stops_before_next_check() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut scanner = Scanner::new(vec![Box::new(Finds(1))], &interrupt);
        let err = scanner
            .run(
                &config(),
                &FakeRunner::new(),
                &PackageInventory::default(),
                |_, _| {},
            )
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[test]
    fn only_filter_keeps_declared_order() {
        let names = vec!["trash".to_string(), "package-cache".to_string()];
        let checks = select_checks(&names).unwrap();
        let got: Vec<_> = checks.iter().map(|c| c.name()).collect();
        assert_eq!(got, vec!["package-cache", "trash"]);
    }

    #[test]
    fn unknown_only_name_is_rejected() {
        let err = select_checks(&["xcode".to_string()]).err().unwrap();
        assert!(matches!(err, Error::UnknownCategory(name, _) if name == "xcode"));
    }

    #[test]
    fn empty_filter_means_everything() {
        assert_eq!(select_checks(&[]).unwrap().len(), 13);
    }
}
