use std::collections::{HashMap, HashSet};
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::cleaner::{Category, Check, CleanupItem, DuplicateFile, Payload, ScanContext};
use crate::errors::Result;
use crate::hasher;

pub struct DuplicateFinder;

/// Files with identical content; the first one seen in walk order is kept.
///
/// Only files sharing an exact size get hashed, which gives the same
/// answer as hashing everything. A file is identified by `(dev, ino)`, so
/// overlapping roots and hard links never count as a second copy.
pub fn find_duplicates(roots: &[PathBuf], min_size: u64) -> Vec<DuplicateFile> {
    // Pass 1: every distinct file in walk order
    let mut candidates: Vec<(PathBuf, u64)> = Vec::new();
    let mut seen_files: HashSet<(u64, u64)> = HashSet::new();
    for root in roots {
        if !root.is_dir() {
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let size = meta.len();
            if size <= min_size || !seen_files.insert((meta.dev(), meta.ino())) {
                continue;
            }
            candidates.push((entry.into_path(), size));
        }
    }

    // Pass 2: group by size
    let mut size_groups: HashMap<u64, Vec<usize>> = HashMap::new();
    for (idx, (_, size)) in candidates.iter().enumerate() {
        size_groups.entry(*size).or_default().push(idx);
    }

    // Pass 3: hash within same-size groups, keep the earliest of each digest
    let mut duplicates: Vec<(usize, usize)> = Vec::new();
    for indices in size_groups.values() {
        if indices.len() < 2 {
            continue;
        }
        let mut first_by_hash: HashMap<blake3::Hash, usize> = HashMap::new();
        for &idx in indices {
            let hash = match hasher::hash_file(&candidates[idx].0) {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!(
                        path = %candidates[idx].0.display(),
                        error = %e,
                        "skipping unreadable file"
                    );
                    continue;
                }
            };
            match first_by_hash.get(&hash) {
                Some(&original) => duplicates.push((idx, original)),
                None => {
                    first_by_hash.insert(hash, idx);
                }
            }
        }
    }

    duplicates.sort_unstable();
    duplicates
        .into_iter()
        .map(|(idx, original)| DuplicateFile {
            path: candidates[idx].0.clone(),
            size_bytes: candidates[idx].1,
            original: candidates[original].0.clone(),
        })
        .collect()
}

impl Check for DuplicateFinder {
    fn category(&self) -> Category {
        Category::DuplicateFiles
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let home = &ctx.config.paths.home;
        let roots: Vec<PathBuf> = ctx
            .config
            .duplicates
            .roots
            .iter()
            .map(|r| home.join(r))
            .collect();

        let files = find_duplicates(&roots, ctx.config.duplicates.min_bytes);
        if files.is_empty() {
            return Ok(None);
        }

        let total_bytes = files.iter().map(|f| f.size_bytes).sum();
        let description = format!("Duplicate files ({} files)", files.len());
        Ok(Some(CleanupItem::new(
            Some(home.clone()),
            total_bytes,
            description,
            Payload::DuplicateFiles { files },
        )))
    }
}
