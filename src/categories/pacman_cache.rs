use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SizedPath};
use crate::errors::Result;
use crate::utils;

/// Old package archives beyond the newest few per package.
pub struct PackageCache;

/// `download-*` staging directories pacman leaves behind after an interrupted sync.
pub struct TempDownloads;

/// `foo-bar-1.2.3-1-x86_64.pkg.tar.zst` -> `foo-bar`.
///
/// The last three dash-separated fields are version, release and arch.
pub fn package_name(file_name: &str) -> String {
    let parts: Vec<&str> = file_name.split('-').collect();
    if parts.len() > 3 {
        parts[..parts.len() - 3].join("-")
    } else {
        Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string())
    }
}

fn is_archive(name: &str) -> bool {
    name.contains(".pkg.tar.") && !name.ends_with(".sig")
}

struct Archive {
    path: std::path::PathBuf,
    modified: SystemTime,
    size: u64,
}

/// Archives that fall outside the `keep` newest of their package.
pub fn removable_archives(cache_dir: &Path, keep: usize) -> Vec<SizedPath> {
    let Ok(read_dir) = std::fs::read_dir(cache_dir) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<String, Vec<Archive>> = BTreeMap::new();
    for entry in read_dir.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if !is_archive(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        groups.entry(package_name(&name)).or_default().push(Archive {
            path: entry.path(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            size: meta.len(),
        });
    }

    let mut removable = Vec::new();
    for (_name, mut archives) in groups {
        if archives.len() <= keep {
            continue;
        }
        archives.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        removable.extend(
            archives
                .into_iter()
                .skip(keep)
                .map(|a| SizedPath::new(a.path, a.size)),
        );
    }
    removable
}

impl Check for PackageCache {
    fn category(&self) -> Category {
        Category::PackageCache
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let cache_dir = &ctx.config.paths.pacman_cache;
        if !cache_dir.is_dir() {
            return Ok(None);
        }

        let keep = ctx.config.packages.keep_versions;
        let archives = removable_archives(cache_dir, keep);
        let total_bytes: u64 = archives.iter().map(|a| a.size_bytes).sum();
        if archives.is_empty() || total_bytes <= ctx.config.thresholds.package_cache {
            return Ok(None);
        }

        let description = format!(
            "Pacman cache ({} old packages to remove, keeping {keep} recent per package)",
            archives.len()
        );
        Ok(Some(CleanupItem::new(
            Some(cache_dir.clone()),
            total_bytes,
            description,
            Payload::PackageCache {
                archives,
                keep_versions: keep,
            },
        )))
    }
}

impl Check for TempDownloads {
    fn category(&self) -> Category {
        Category::PackageTempDownloads
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let cache_dir = &ctx.config.paths.pacman_cache;
        let Ok(read_dir) = std::fs::read_dir(cache_dir) else {
            return Ok(None);
        };

        let mut dirs: Vec<_> = read_dir
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("download-"))
            .map(|e| e.path())
            .collect();
        if dirs.is_empty() {
            return Ok(None);
        }
        dirs.sort();

        let total_bytes = dirs.iter().map(|d| utils::entry_size(d)).sum();
        let description = format!("Pacman temporary download folders ({} folders)", dirs.len());
        Ok(Some(CleanupItem::new(
            Some(cache_dir.clone()),
            total_bytes,
            description,
            Payload::PackageTempDownloads { dirs },
        )))
    }
}
