use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SizedPath};
use crate::errors::Result;
use crate::utils;

/// Cache subdirectories known to regenerate on demand.
const SAFE_CACHES: &[&str] = &["thumbnails", "pip", "npm", "go-build", "cargo", "maven"];

pub struct UserCache;

impl Check for UserCache {
    fn category(&self) -> Category {
        Category::UserCacheDir
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let cache_root = &ctx.config.paths.cache_root;
        let Ok(read_dir) = std::fs::read_dir(cache_root) else {
            return Ok(None);
        };

        let mut subdirs: Vec<_> = read_dir
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.path())
            .collect();
        subdirs.sort();

        let mut dirs: Vec<SizedPath> = Vec::new();
        for fragment in SAFE_CACHES {
            let matched = subdirs.iter().find(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase().contains(fragment))
                    .unwrap_or(false)
            });
            let Some(path) = matched else { continue };
            if dirs.iter().any(|d| &d.path == path) {
                continue;
            }
            let size = utils::dir_size(path);
            if size > ctx.config.thresholds.user_cache {
                dirs.push(SizedPath::new(path.clone(), size));
            }
        }

        if dirs.is_empty() {
            return Ok(None);
        }

        let total_bytes = dirs.iter().map(|d| d.size_bytes).sum();
        let names: Vec<String> = dirs
            .iter()
            .filter_map(|d| d.path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        let description = format!("Cache: {}", names.join(", "));
        Ok(Some(CleanupItem::new(
            Some(cache_root.clone()),
            total_bytes,
            description,
            Payload::UserCacheDir { dirs },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::testutil::Fixture;
    use std::fs;

    #[test]
    fn only_allow_listed_caches_over_threshold() {
        let mut fx = Fixture::new();
        fx.config.thresholds.user_cache = 100;
        let root = fx.config.paths.cache_root.clone();
        let dirs = [
            ("pip", 500),
            ("go-build", 50),
            ("mozilla", 10_000),
            ("npm-cache", 300),
        ];
        for (name, size) in dirs {
            fs::create_dir_all(root.join(name)).unwrap();
            fs::write(root.join(name).join("blob"), vec![0u8; size]).unwrap();
        }

        let item = UserCache.scan(&fx.ctx()).unwrap().unwrap();
        assert_eq!(item.estimated_bytes, 800);
        assert!(item.safe && item.reversible);
        match item.payload {
            Payload::UserCacheDir { dirs } => {
                let names: Vec<_> = dirs
                    .iter()
                    .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
                    .collect();
                assert_eq!(names, vec!["pip", "npm-cache"]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn empty_cache_root_reports_nothing() {
        let fx = Fixture::new();
        assert!(UserCache.scan(&fx.ctx()).unwrap().is_none());
    }
}
