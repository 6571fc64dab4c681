use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SizedPath};
use crate::errors::Result;
use crate::utils;

const DAY: Duration = Duration::from_secs(86_400);

/// Small stale files desktop sessions leave in the home directory.
pub struct TempFiles;

fn candidates(home: &Path) -> Vec<PathBuf> {
    let mut found = vec![home.join(".local/share/recently-used.xbel")];

    if let Ok(read_dir) = std::fs::read_dir(home) {
        let mut backups: Vec<PathBuf> = read_dir
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".Xauthority-"))
            .map(|e| e.path())
            .collect();
        backups.sort();
        found.extend(backups);
    }

    found
}

impl Check for TempFiles {
    fn category(&self) -> Category {
        Category::StaleTempFiles
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let home = &ctx.config.paths.home;
        let thresholds = &ctx.config.thresholds;
        let max_age = DAY * thresholds.temp_file_age_days as u32;

        let files: Vec<SizedPath> = candidates(home)
            .into_iter()
            .filter_map(|path| {
                let meta = std::fs::symlink_metadata(&path).ok()?;
                if !meta.is_file() || meta.len() >= thresholds.temp_file_max {
                    return None;
                }
                if !utils::older_than(&path, max_age, ctx.now) {
                    return None;
                }
                Some(SizedPath::new(path, meta.len()))
            })
            .collect();

        if files.is_empty() {
            return Ok(None);
        }

        let total_bytes = files.iter().map(|f| f.size_bytes).sum();
        let description = format!("Temporary files ({} files)", files.len());
        Ok(Some(CleanupItem::new(
            Some(home.clone()),
            total_bytes,
            description,
            Payload::StaleTempFiles { files },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::testutil::Fixture;
    use filetime::FileTime;
    use std::fs;
    use std::time::SystemTime;

    fn age(path: &Path, days: u64) {
        let when = SystemTime::now() - DAY * days as u32;
        filetime::set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
    }

    #[test]
    fn only_old_small_files_qualify() {
        let mut fx = Fixture::new();
        fx.config.thresholds.temp_file_max = 1_000;
        let home = fx.config.paths.home.clone();
        fs::create_dir_all(home.join(".local/share")).unwrap();

        let xbel = home.join(".local/share/recently-used.xbel");
        fs::write(&xbel, vec![b'<'; 200]).unwrap();
        age(&xbel, 45);

        let fresh = home.join(".Xauthority-abc");
        fs::write(&fresh, b"cookie").unwrap();
        age(&fresh, 2);

        let big = home.join(".Xauthority-big");
        fs::write(&big, vec![0u8; 5_000]).unwrap();
        age(&big, 90);

        let old = home.join(".Xauthority-old");
        fs::write(&old, b"cookie").unwrap();
        age(&old, 31);

        // The live authority file is never a candidate.
        let live = home.join(".Xauthority");
        fs::write(&live, b"cookie").unwrap();
        age(&live, 400);

        let item = TempFiles.scan(&fx.ctx()).unwrap().unwrap();
        assert_eq!(item.estimated_bytes, 206);
        match item.payload {
            Payload::StaleTempFiles { files } => {
                let paths: Vec<_> = files.into_iter().map(|f| f.path).collect();
                assert_eq!(paths, vec![xbel, old]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn nothing_old_nothing_reported() {
        let fx = Fixture::new();
        fs::write(fx.config.paths.home.join(".Xauthority-new"), b"c").unwrap();
        assert!(TempFiles.scan(&fx.ctx()).unwrap().is_none());
    }
}
