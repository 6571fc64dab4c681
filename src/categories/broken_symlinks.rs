use std::path::Path;

use walkdir::WalkDir;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext};
use crate::errors::Result;

/// Directory names skipped for performance and noise.
const SKIP_DIRS: &[&str] = &[".git", ".cache", "snap"];

/// Stop collecting after this many broken links.
pub const MAX_LINKS: usize = 1000;

pub struct BrokenSymlinks;

fn should_skip(name: &str) -> bool {
    SKIP_DIRS.iter().any(|&s| name == s)
}

/// Symlinks under `root` whose target does not resolve, up to `cap` of them.
pub fn find_broken_links(root: &Path, skip: &[&Path], cap: usize) -> Vec<std::path::PathBuf> {
    let mut links = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.file_type().is_dir() {
                let name = e.file_name().to_string_lossy();
                return !should_skip(&name) && !skip.iter().any(|s| e.path() == *s);
            }
            true
        })
        .filter_map(|e| e.ok())
    {
        if !entry.path_is_symlink() {
            continue;
        }

        // Target gone, or a loop that never resolves.
        if std::fs::metadata(entry.path()).is_err() {
            links.push(entry.path().to_path_buf());
            if links.len() >= cap {
                tracing::debug!(cap, "broken symlink cap reached, stopping walk");
                break;
            }
        }
    }

    links
}

impl Check for BrokenSymlinks {
    fn category(&self) -> Category {
        Category::BrokenSymlinks
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let paths = &ctx.config.paths;
        if !paths.home.is_dir() {
            return Ok(None);
        }

        let links = find_broken_links(
            &paths.home,
            &[paths.trash.as_path(), paths.cache_root.as_path()],
            MAX_LINKS,
        );
        if links.is_empty() {
            return Ok(None);
        }

        let description = format!("Broken symlinks ({} links)", links.len());
        Ok(Some(CleanupItem::new(
            Some(paths.home.clone()),
            0,
            description,
            Payload::BrokenSymlinks { links },
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::categories::testutil::Fixture;
    use std::fs;
    use std::os::unix::fs::symlink;

    #[test]
    fn finds_dangling_links_outside_skipped_trees() {
        let fx = Fixture::new();
        let home = &fx.config.paths.home;
        fs::write(home.join("real"), b"x").unwrap();
        symlink(home.join("real"), home.join("good")).unwrap();
        symlink(home.join("gone"), home.join("dangling")).unwrap();
        fs::create_dir_all(home.join("projects/.git")).unwrap();
        symlink(home.join("gone"), home.join("projects/.git/HEAD.lock")).unwrap();
        fs::create_dir_all(home.join(".local/share/Trash/files")).unwrap();
        symlink(home.join("gone"), home.join(".local/share/Trash/files/old")).unwrap();
        fs::create_dir_all(home.join("nested/deeper")).unwrap();
        symlink("/nonexistent/target", home.join("nested/deeper/link")).unwrap();

        let item = BrokenSymlinks.scan(&fx.ctx()).unwrap().unwrap();
        assert_eq!(item.estimated_bytes, 0);
        match item.payload {
            Payload::BrokenSymlinks { links } => {
                assert_eq!(
                    links,
                    vec![home.join("dangling"), home.join("nested/deeper/link")]
                );
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn walk_stops_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            symlink(dir.path().join("missing"), dir.path().join(format!("l{i}"))).unwrap();
        }
        assert_eq!(find_broken_links(dir.path(), &[], 4).len(), 4);
    }

    #[test]
    fn self_loop_counts_as_broken() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("loop");
        symlink(&link, &link).unwrap();
        assert_eq!(find_broken_links(dir.path(), &[], 10), vec![link]);
    }
}
