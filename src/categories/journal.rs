use std::path::PathBuf;
use std::time::Duration;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext};
use crate::errors::Result;
use crate::utils;

const TIMEOUT: Duration = Duration::from_secs(10);

/// systemd journal beyond a size limit; cleaned by vacuuming old entries.
pub struct JournalLogs;

/// Pull the size out of "Archived and active journals take up 1.2G in the file system."
pub fn parse_disk_usage(output: &str) -> Option<u64> {
    let (_, rest) = output.split_once("take up")?;
    let token = rest.split_whitespace().next()?;
    utils::parse_size(token).ok()
}

impl Check for JournalLogs {
    fn category(&self) -> Category {
        Category::JournalLogs
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let output = ctx
            .runner
            .run_checked("journalctl", &["--disk-usage"], TIMEOUT)?;
        let Some(size) = parse_disk_usage(&output) else {
            tracing::debug!(%output, "unrecognised journalctl output");
            return Ok(None);
        };
        if size <= ctx.config.thresholds.journal {
            return Ok(None);
        }

        let retain_days = ctx.config.packages.journal_retain_days;
        Ok(Some(CleanupItem::new(
            Some(PathBuf::from("/var/log/journal")),
            size,
            format!("Systemd journal logs (keeping {retain_days} days)"),
            Payload::JournalLogs { retain_days },
        )))
    }
}
