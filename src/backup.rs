//! Best-effort Timeshift snapshots before destructive work.
//!
//! Every snapshot this tool creates carries the configured tag in its
//! comment, which is how earlier ones are found again for pruning. No
//! failure in here is allowed to stop a cleanup.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::command::CommandRunner;
use crate::config::BackupConfig;
use crate::errors::{Error, Result};

const TOOL: &str = "timeshift";
const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const DELETE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Timeshift snapshot name, a `YYYY-MM-DD_HH-MM-SS` stamp.
    pub name: String,
    pub description: String,
    pub date: String,
}

/// Last snapshot created by this tool, persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupRecord {
    pub timestamp: DateTime<Local>,
    pub description: String,
}

#[derive(Deserialize)]
struct JsonListing {
    #[serde(default)]
    snapshots: Vec<JsonSnapshot>,
}

#[derive(Deserialize)]
struct JsonSnapshot {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    date: String,
}

pub struct BackupCoordinator<'a> {
    runner: &'a dyn CommandRunner,
    tag: String,
    create_timeout: Duration,
    state_file: PathBuf,
}

impl<'a> BackupCoordinator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &BackupConfig, state_file: PathBuf) -> Self {
        Self {
            runner,
            tag: config.tag.clone(),
            create_timeout: Duration::from_secs(config.create_timeout_secs),
            state_file,
        }
    }

    pub fn is_available(&self) -> bool {
        self.runner.is_available(TOOL)
    }

    /// Snapshots carrying our tag, newest first. Empty on any failure.
    pub fn list_tagged_backups(&self) -> Vec<Snapshot> {
        match self.try_list() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::debug!(error = %e, "could not list snapshots");
                Vec::new()
            }
        }
    }

    fn try_list(&self) -> Result<Vec<Snapshot>> {
        let stdout = self
            .runner
            .run_privileged_checked(TOOL, &["--list", "--scripted"], LIST_TIMEOUT)?;
        let tag = self.tag.to_lowercase();
        let mut snapshots: Vec<Snapshot> = parse_listing(&stdout)
            .into_iter()
            .filter(|s| s.description.to_lowercase().contains(&tag))
            .collect();
        snapshots.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(snapshots)
    }

    /// Create a tagged snapshot. Returns whether one was created.
    pub fn create_backup(&self, description: &str) -> bool {
        if !self.is_available() {
            tracing::warn!("timeshift is not installed, skipping snapshot");
            return false;
        }
        let description = if description.is_empty() {
            "System cleanup"
        } else {
            description
        };
        let comment = format!("{} - {description}", self.tag);

        match self.runner.run_privileged_checked(
            TOOL,
            &["--create", "--comments", &comment, "--scripted"],
            self.create_timeout,
        ) {
            Ok(_) => {
                if let Err(e) = self.write_record(&comment) {
                    tracing::warn!(error = %e, "snapshot created but state file not written");
                }
                tracing::info!(%comment, "snapshot created");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot creation failed");
                false
            }
        }
    }

    /// Delete every tagged snapshot except the newest. Returns how many went.
    pub fn prune_to_single_backup(&self) -> usize {
        let snapshots = self.list_tagged_backups();
        let mut removed = 0;
        for old in snapshots.iter().skip(1) {
            match self.runner.run_privileged_checked(
                TOOL,
                &["--delete", "--snapshot", &old.name, "--scripted"],
                DELETE_TIMEOUT,
            ) {
                Ok(_) => {
                    tracing::info!(snapshot = %old.name, "old snapshot removed");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(snapshot = %old.name, error = %e, "could not remove snapshot")
                }
            }
        }
        removed
    }

    /// Prune, then create. Run right before anything destructive.
    pub fn ensure_single_backup(&self, description: &str) -> bool {
        self.prune_to_single_backup();
        self.create_backup(description)
    }

    pub fn last_record(&self) -> Option<BackupRecord> {
        let raw = fs::read_to_string(&self.state_file).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write_record(&self, description: &str) -> Result<()> {
        let record = BackupRecord {
            timestamp: Local::now(),
            description: description.to_string(),
        };
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let json = serde_json::to_string(&record).map_err(|e| Error::json("backup record", e))?;
        fs::write(&self.state_file, json).map_err(|e| Error::io(&self.state_file, e))
    }
}

/// Accept either a JSON listing or Timeshift's text table.
fn parse_listing(stdout: &str) -> Vec<Snapshot> {
    if let Ok(listing) = serde_json::from_str::<JsonListing>(stdout) {
        return listing
            .snapshots
            .into_iter()
            .map(|s| Snapshot {
                date: if s.date.is_empty() { s.name.clone() } else { s.date },
                name: s.name,
                description: s.description,
            })
            .collect();
    }
    parse_table(stdout)
}

/// Rows look like `0    >  2024-05-01_10-00-01  O     tidyarch - Before cleanup`.
fn parse_table(stdout: &str) -> Vec<Snapshot> {
    let mut snapshots = Vec::new();
    let mut in_rows = false;
    for line in stdout.lines() {
        if line.trim_start().starts_with("---") {
            in_rows = true;
            continue;
        }
        if !in_rows {
            continue;
        }
        let mut tokens = line.split_whitespace().peekable();
        let Some(num) = tokens.next() else { continue };
        if !num.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if tokens.peek() == Some(&">") {
            tokens.next();
        }
        let Some(name) = tokens.next() else { continue };
        if tokens
            .peek()
            .is_some_and(|t| t.chars().all(|c| "OBHDWM".contains(c)))
        {
            tokens.next();
        }
        let description = tokens.collect::<Vec<_>>().join(" ");
        snapshots.push(Snapshot {
            name: name.to_string(),
            date: name.to_string(),
            description,
        });
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;

    const TABLE: &str = "\
Mounted '/dev/sda2' at '/run/timeshift/backup'
Device : /dev/sda2
------------------------------------------------------------------------------
Num     Name                 Tags  Description
------------------------------------------------------------------------------
0    >  2024-05-01_10-00-01  O     tidyarch - Before cleanup: trash
1    >  2024-05-03_09-12-44  D     daily
2    >  2024-06-10_18-30-00  O     TidyArch - Before cleanup: journal-logs
3    >  2024-06-11_07-00-00        manual snapshot
";

    fn coordinator<'a>(runner: &'a FakeRunner, dir: &std::path::Path) -> BackupCoordinator<'a> {
        BackupCoordinator::new(runner, &BackupConfig::default(), dir.join("state.json"))
    }

    #[test]
    fn table_listing_filters_by_tag_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().ok("timeshift --list --scripted", TABLE);
        let backups = coordinator(&runner, dir.path()).list_tagged_backups();

        let names: Vec<_> = backups.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["2024-06-10_18-30-00", "2024-05-01_10-00-01"]);
        assert_eq!(backups[1].description, "tidyarch - Before cleanup: trash");
    }

    #[test]
    fn json_listing_is_understood() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"snapshots":[
            {"name":"a","description":"tidyarch - one","date":"2024-01-01 10:00"},
            {"name":"b","description":"tidyarch - two","date":"2024-03-01 10:00"},
            {"name":"c","description":"other","date":"2024-04-01 10:00"}]}"#;
        let runner = FakeRunner::new().ok("timeshift --list --scripted", json);
        let backups = coordinator(&runner, dir.path()).list_tagged_backups();
        let names: Vec<_> = backups.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn listing_failure_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().fail("timeshift --list --scripted");
        assert!(coordinator(&runner, dir.path()).list_tagged_backups().is_empty());
    }

    #[test]
    fn prune_keeps_only_newest() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new()
            .ok("timeshift --list --scripted", TABLE)
            .ok("timeshift --delete --snapshot 2024-05-01_10-00-01 --scripted", "");
        let removed = coordinator(&runner, dir.path()).prune_to_single_backup();

        assert_eq!(removed, 1);
        let deletes: Vec<_> = runner
            .calls()
            .into_iter()
            .filter(|c| c.contains("--delete"))
            .collect();
        assert_eq!(
            deletes,
            vec!["timeshift --delete --snapshot 2024-05-01_10-00-01 --scripted"]
        );
    }

    #[test]
    fn create_writes_state_record() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new()
            .with_program("timeshift")
            .ok(
                "timeshift --create --comments tidyarch - Before cleanup: trash --scripted",
                "",
            );
        let coord = coordinator(&runner, dir.path());

        assert!(coord.create_backup("Before cleanup: trash"));
        let record = coord.last_record().unwrap();
        assert_eq!(record.description, "tidyarch - Before cleanup: trash");
        assert!(Local::now().signed_duration_since(record.timestamp).num_seconds() < 60);
    }

    #[test]
    fn create_degrades_without_tool_or_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FakeRunner::new();
        assert!(!coordinator(&missing, dir.path()).create_backup("x"));
        assert!(missing.calls().is_empty());

        let failing = FakeRunner::new()
            .with_program("timeshift")
            .fail("timeshift --create --comments tidyarch - x --scripted");
        let coord = coordinator(&failing, dir.path());
        assert!(!coord.create_backup("x"));
        assert!(coord.last_record().is_none());
    }

    #[test]
    fn ensure_single_prunes_then_creates() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new()
            .with_program("timeshift")
            .ok("timeshift --list --scripted", TABLE)
            .ok("timeshift --delete --snapshot 2024-05-01_10-00-01 --scripted", "")
            .ok("timeshift --create --comments tidyarch - run --scripted", "");

        assert!(coordinator(&runner, dir.path()).ensure_single_backup("run"));
        let calls = runner.calls();
        assert!(calls[0].contains("--list"));
        assert!(calls.last().unwrap().contains("--create"));
    }
}
