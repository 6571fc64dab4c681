//! The interactive run: banner, scan, selection, confirmation, snapshot,
//! deletion, summary.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::backup::BackupCoordinator;
use crate::cleaner::CleanupItem;
use crate::command::CommandRunner;
use crate::config::Config;
use crate::disk_info;
use crate::errors::{Error, Result};
use crate::executor::Executor;
use crate::interrupt::Interrupt;
use crate::oplog::OperationLog;
use crate::output;
use crate::scanner::{self, ScanReport, Scanner};
use crate::selector;
use crate::utils::display_path;

/// Run-wide switches that come from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub offline: bool,
    pub no_backup: bool,
}

pub struct Session<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    interrupt: &'a Interrupt,
    log: OperationLog,
    options: SessionOptions,
}

/// "Before cleanup: package-cache, trash, thumbnails +2 more"
fn backup_description(items: &[CleanupItem]) -> String {
    let mut names: Vec<&str> = items.iter().take(3).map(|i| i.category().name()).collect();
    names.dedup();
    let mut desc = format!("Before cleanup: {}", names.join(", "));
    if items.len() > 3 {
        desc.push_str(&format!(" +{} more", items.len() - 3));
    }
    desc
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        interrupt: &'a Interrupt,
        options: SessionOptions,
    ) -> Self {
        Self {
            config,
            runner,
            interrupt,
            log: OperationLog::new(config.paths.operation_log()),
            options,
        }
    }

    #[cfg(test)]
    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    fn backups(&self) -> BackupCoordinator<'a> {
        BackupCoordinator::new(
            self.runner,
            &self.config.backup,
            self.config.paths.backup_state(),
        )
    }

    fn backups_wanted(&self) -> bool {
        self.config.backup.enabled && !self.options.no_backup
    }

    fn print_banner(&self) {
        output::print_banner();
        if self.backups_wanted() {
            let backups = self.backups();
            let available = backups.is_available();
            let existing = if available {
                backups.list_tagged_backups().len()
            } else {
                0
            };
            output::print_backup_status(available, existing);
        }
        output::print_log_location(&display_path(self.log.path(), &self.config.paths.home));
    }

    /// Take the package inventories, then run every requested check.
    pub fn scan(&self, only: &[String]) -> Result<ScanReport> {
        let checks = scanner::select_checks(only)?;
        let inventory = scanner::load_inventory(self.config, self.runner, self.options.offline);
        self.interrupt.check()?;

        let mut scanner = Scanner::new(checks, self.interrupt);
        let total = scanner.check_count();
        let report = scanner.run(self.config, self.runner, &inventory, |step, label| {
            output::print_scan_step(step, total, label);
        })?;
        tracing::debug!(phase = ?scanner.phase(), checks = total, "scanner stopped");

        self.log
            .record(&format!("Scan completed. Found {} items", report.items.len()));
        Ok(report)
    }

    /// `tidyarch scan`: results only, nothing is deleted.
    pub fn run_scan(&self, only: &[String], out: &mut impl Write) -> Result<()> {
        output::print_banner();
        let report = self.scan(only)?;
        if report.is_empty() {
            output::print_system_clean();
            return Ok(());
        }
        output::write_results(out, &report.items).map_err(|e| Error::io("<stdout>", e))
    }

    /// `tidyarch backups`
    pub fn list_backups(&self) {
        let backups = self.backups();
        if !backups.is_available() {
            output::print_backup_status(false, 0);
            return;
        }
        output::print_backups(&backups.list_tagged_backups());
        if let Some(record) = backups.last_record() {
            output::print_info(&format!(
                "Last created here: {} ({})",
                record.description,
                record.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
    }

    /// The full interactive cleanup.
    pub fn run_clean(
        &self,
        only: &[String],
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        self.print_banner();
        let root = Path::new("/");
        let before = disk_info::disk_info(root);

        let report = self.scan(only)?;
        if report.is_empty() {
            output::print_system_clean();
            return Ok(());
        }

        let home = &self.config.paths.home;
        let chosen = selector::select_items(&report.items, home, input, out, self.interrupt)?;
        if chosen.is_empty() {
            return Err(Error::Cancelled);
        }

        output::write_final_confirmation(out, &chosen).map_err(|e| Error::io("<stdout>", e))?;

        let backups = self.backups();
        let snapshot = if self.backups_wanted() && backups.is_available() {
            selector::confirm(
                input,
                out,
                self.interrupt,
                "Create Timeshift backup before cleanup?",
                true,
            )?
        } else {
            false
        };

        if !selector::confirm(input, out, self.interrupt, "Proceed with cleanup?", false)? {
            return Err(Error::Cancelled);
        }

        if snapshot {
            let description = backup_description(&chosen);
            output::print_info("Managing backups...");
            if backups.ensure_single_backup(&description) {
                self.log.record(&format!("Backup created: {description}"));
            } else {
                output::print_warning("Snapshot failed; continuing without one.");
            }
        }

        let executor = Executor::new(self.runner, &self.log, self.interrupt);
        let result = executor.run(&chosen, |item, ok| {
            output::print_item_outcome(&item.description, ok);
        })?;

        output::print_clean_complete(
            result.succeeded,
            result.failed,
            &display_path(self.log.path(), home),
        );

        output::print_separator();
        if let Some(info) = before {
            output::print_free_space("Free before:", info.available);
        }
        if let Some(info) = disk_info::disk_info(root) {
            output::print_free_space("Free after:", info.available);
            tracing::info!(used_percent = info.usage_percent(), "root filesystem");
        }
        Ok(())
    }
}
