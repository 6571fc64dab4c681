//! Names known to the AUR, cached locally for a day.
//!
//! The fetch is the only network access in the tool. Each request carries
//! its own timeout and the page loop has a hard cap, so a slow or broken
//! endpoint costs at most `max_pages * request_timeout`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::RemoteIndexConfig;
use crate::errors::{Error, Result};

/// One page of package names from a remote index.
pub trait IndexSource {
    fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<String>>;
}

/// AUR RPC v5 search endpoint.
pub struct AurRpc {
    client: reqwest::blocking::Client,
    url: String,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    resultcount: usize,
    #[serde(default)]
    results: Vec<RpcPackage>,
}

impl RpcResponse {
    /// An error reply also has `resultcount: 0`, so it must be told apart
    /// from a genuinely empty last page.
    fn into_names(self) -> Result<Vec<String>> {
        if self.kind == "error" {
            return Err(Error::RemoteIndex(
                self.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        if self.resultcount == 0 {
            return Ok(Vec::new());
        }
        Ok(self.results.into_iter().map(|p| p.name).collect())
    }
}

#[derive(Deserialize)]
struct RpcPackage {
    #[serde(rename = "Name")]
    name: String,
}

impl AurRpc {
    pub fn new(config: &RemoteIndexConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("tidyarch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl IndexSource for AurRpc {
    fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let offset = offset.to_string();
        let response: RpcResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("type", "search"),
                ("arg", "*"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        response.into_names()
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    packages: Vec<String>,
    /// Seconds since the Unix epoch.
    timestamp: u64,
}

pub struct RemoteIndex<S> {
    source: S,
    cache_path: PathBuf,
    ttl: Duration,
    page_size: usize,
    max_pages: usize,
}

impl<S: IndexSource> RemoteIndex<S> {
    pub fn new(source: S, cache_path: PathBuf, config: &RemoteIndexConfig) -> Self {
        Self {
            source,
            cache_path,
            ttl: Duration::from_secs(config.ttl_hours * 3600),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages,
        }
    }

    /// Package names, from the cache when it is fresh, otherwise from the network.
    /// With `offline`, a stale cache is still better than nothing.
    pub fn packages(&self, offline: bool) -> HashSet<String> {
        self.packages_at(SystemTime::now(), offline)
    }

    pub fn packages_at(&self, now: SystemTime, offline: bool) -> HashSet<String> {
        let cached = read_cache(&self.cache_path);

        if let Some(cache) = &cached {
            if offline || cache_age(cache, now) < self.ttl {
                tracing::debug!(count = cache.packages.len(), "remote index served from cache");
                return cache.packages.iter().cloned().collect();
            }
        } else if offline {
            return HashSet::new();
        }

        match self.fetch_all() {
            Ok(packages) => {
                if let Err(e) = write_cache(&self.cache_path, &packages, now) {
                    tracing::warn!(error = %e, "could not write remote index cache");
                }
                packages
            }
            Err((partial, e)) => {
                tracing::warn!(error = %e, fetched = partial.len(), "remote index fetch aborted");
                match cached {
                    Some(stale) if partial.is_empty() => stale.packages.into_iter().collect(),
                    _ => partial,
                }
            }
        }
    }

    /// Page through the source until a short or empty page.
    /// On error, hands back what was collected so far alongside the cause.
    fn fetch_all(&self) -> std::result::Result<HashSet<String>, (HashSet<String>, Error)> {
        let mut packages = HashSet::new();
        for page in 0..self.max_pages {
            let names = match self.source.fetch_page(page * self.page_size, self.page_size) {
                Ok(names) => names,
                Err(e) => return Err((packages, e)),
            };
            let count = names.len();
            packages.extend(names);
            tracing::debug!(page, total = packages.len(), "fetched remote index page");
            if count < self.page_size {
                return Ok(packages);
            }
        }
        tracing::warn!(max_pages = self.max_pages, "remote index page cap reached");
        Ok(packages)
    }
}

fn cache_age(cache: &CacheFile, now: SystemTime) -> Duration {
    let written = UNIX_EPOCH + Duration::from_secs(cache.timestamp);
    now.duration_since(written).unwrap_or(Duration::ZERO)
}

fn read_cache(path: &Path) -> Option<CacheFile> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable index cache");
            None
        }
    }
}

fn write_cache(path: &Path, packages: &HashSet<String>, now: SystemTime) -> Result<()> {
    let mut names: Vec<String> = packages.iter().cloned().collect();
    names.sort();
    let cache = CacheFile {
        packages: names,
        timestamp: now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_string(&cache).map_err(|e| Error::json("index cache", e))?;
    fs::write(path, json).map_err(|e| Error::io(path, e))
}
