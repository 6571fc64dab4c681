use std::path::PathBuf;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SubCache};
use crate::config::{PathsConfig, Thresholds};
use crate::errors::Result;
use crate::utils;

enum Base {
    Home,
    CacheRoot,
}

struct KnownCache {
    name: &'static str,
    base: Base,
    path: &'static [&'static str], // path components relative to base
    threshold: fn(&Thresholds) -> u64,
}

impl KnownCache {
    fn resolve(&self, paths: &PathsConfig) -> PathBuf {
        let mut path = match self.base {
            Base::Home => paths.home.clone(),
            Base::CacheRoot => paths.cache_root.clone(),
        };
        for component in self.path {
            path.push(component);
        }
        path
    }
}

fn npm_cache(t: &Thresholds) -> u64 {
    t.npm_cache
}

fn cargo_cache(t: &Thresholds) -> u64 {
    t.cargo_cache
}

fn pip_cache(t: &Thresholds) -> u64 {
    t.pip_cache
}

fn go_cache(t: &Thresholds) -> u64 {
    t.go_cache
}

fn maven_cache(t: &Thresholds) -> u64 {
    t.maven_cache
}

const KNOWN_CACHES: &[KnownCache] = &[
    KnownCache {
        name: "npm cache",
        base: Base::Home,
        path: &[".npm"],
        threshold: npm_cache,
    },
    KnownCache {
        name: "Cargo registry cache",
        base: Base::Home,
        path: &[".cargo", "registry", "cache"],
        threshold: cargo_cache,
    },
    KnownCache {
        name: "Pip cache",
        base: Base::CacheRoot,
        path: &["pip"],
        threshold: pip_cache,
    },
    KnownCache {
        name: "Go build cache",
        base: Base::CacheRoot,
        path: &["go-build"],
        threshold: go_cache,
    },
    KnownCache {
        name: "Maven cache",
        base: Base::Home,
        path: &[".m2", "repository"],
        threshold: maven_cache,
    },
];

/// Language toolchain caches, bundled into a single item.
pub struct BuildCaches;

impl Check for BuildCaches {
    fn category(&self) -> Category {
        Category::BuildCache
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let mut caches = Vec::new();

        for known in KNOWN_CACHES {
            let path = known.resolve(&ctx.config.paths);
            if !path.is_dir() {
                continue;
            }
            let size = utils::dir_size(&path);
            if size > (known.threshold)(&ctx.config.thresholds) {
                caches.push(SubCache {
                    name: known.name,
                    path,
                    size_bytes: size,
                });
            }
        }

        if caches.is_empty() {
            return Ok(None);
        }

        let total_bytes = caches.iter().map(|c| c.size_bytes).sum();
        let description = format!("Build system caches ({} caches)", caches.len());
        Ok(Some(CleanupItem::new(
            Some(ctx.config.paths.home.clone()),
            total_bytes,
            description,
            Payload::BuildCache { caches },
        )))
    }
}
