//! Configuration: optional TOML file layered over built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

const MIB: u64 = 1_048_576;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub thresholds: Thresholds,
    pub packages: PackagesConfig,
    pub remote_index: RemoteIndexConfig,
    pub backup: BackupConfig,
    pub duplicates: DuplicatesConfig,
}

/// Filesystem locations the checks look at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub home: PathBuf,
    /// User cache root, usually `~/.cache`.
    pub cache_root: PathBuf,
    /// Where the package-name cache, backup record and operation log live.
    pub state_dir: PathBuf,
    pub pacman_cache: PathBuf,
    /// System config root, `/etc`.
    pub config_root: PathBuf,
    pub trash: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        let cache_root = dirs::cache_dir().unwrap_or_else(|| home.join(".cache"));
        let data_dir = dirs::data_dir().unwrap_or_else(|| home.join(".local/share"));
        Self {
            state_dir: cache_root.join("tidyarch"),
            trash: data_dir.join("Trash"),
            cache_root,
            home,
            pacman_cache: PathBuf::from("/var/cache/pacman/pkg"),
            config_root: PathBuf::from("/etc"),
        }
    }
}

impl PathsConfig {
    /// Lay out every path under `root`; used to point the checks at a fixture tree.
    #[cfg(test)]
    pub fn rooted_at(root: &Path) -> Self {
        let home = root.join("home");
        Self {
            cache_root: home.join(".cache"),
            state_dir: home.join(".cache/tidyarch"),
            trash: home.join(".local/share/Trash"),
            home,
            pacman_cache: root.join("var/cache/pacman/pkg"),
            config_root: root.join("etc"),
        }
    }

    pub fn remote_index_cache(&self) -> PathBuf {
        self.state_dir.join("aur_packages.json")
    }

    pub fn backup_state(&self) -> PathBuf {
        self.state_dir.join("timeshift_backup.json")
    }

    pub fn operation_log(&self) -> PathBuf {
        self.state_dir.join("backups").join("cleanup.log")
    }
}

/// Minimum sizes below which a category is not reported at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub package_cache: u64,
    pub journal: u64,
    pub user_cache: u64,
    pub npm_cache: u64,
    pub cargo_cache: u64,
    pub pip_cache: u64,
    pub go_cache: u64,
    pub maven_cache: u64,
    pub trash: u64,
    pub thumbnails: u64,
    /// Temp files at or above this size are left alone.
    pub temp_file_max: u64,
    pub temp_file_age_days: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            package_cache: 100 * MIB,
            journal: 500 * MIB,
            user_cache: 100 * MIB,
            npm_cache: 100 * MIB,
            cargo_cache: 200 * MIB,
            pip_cache: 100 * MIB,
            go_cache: 200 * MIB,
            maven_cache: 500 * MIB,
            trash: MIB,
            thumbnails: 50 * MIB,
            temp_file_max: MIB,
            temp_file_age_days: 30,
        }
    }
}

impl Thresholds {
    /// Report everything regardless of size.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            package_cache: 0,
            journal: 0,
            user_cache: 0,
            npm_cache: 0,
            cargo_cache: 0,
            pip_cache: 0,
            go_cache: 0,
            maven_cache: 0,
            trash: 0,
            thumbnails: 0,
            temp_file_max: u64::MAX,
            temp_file_age_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackagesConfig {
    /// Cached archives kept per package name.
    pub keep_versions: usize,
    /// Flat size guess per orphaned package.
    pub orphan_estimate_bytes: u64,
    pub journal_retain_days: u32,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            keep_versions: 3,
            orphan_estimate_bytes: 10 * MIB,
            journal_retain_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteIndexConfig {
    pub enabled: bool,
    pub url: String,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout_secs: u64,
    pub ttl_hours: u64,
}

impl Default for RemoteIndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://aur.archlinux.org/rpc/v5/search".to_string(),
            page_size: 250,
            max_pages: 400,
            request_timeout_secs: 10,
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Marker placed in every snapshot comment this tool creates.
    pub tag: String,
    pub create_timeout_secs: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tag: "tidyarch".to_string(),
            create_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DuplicatesConfig {
    /// Search roots relative to the home directory.
    pub roots: Vec<PathBuf>,
    /// Files must be strictly larger than this to be hashed.
    pub min_bytes: u64,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from(".cache/thumbnails"),
                PathBuf::from(".cache/fontconfig"),
                PathBuf::from("Downloads"),
            ],
            min_bytes: 1024,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("tidyarch")
            .join("config.toml")
    }

    /// Load config from an explicit path or the default location.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        if !path_buf.exists() {
            if path.is_some() {
                return Err(Error::MissingConfig { path: path_buf });
            }
            tracing::debug!(path = %path_buf.display(), "no config file, using defaults");
            return Self::default().validated();
        }

        let raw = fs::read_to_string(&path_buf).map_err(|e| Error::io(&path_buf, e))?;
        let cfg: Self = toml::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path_buf.clone(),
            source,
        })?;
        tracing::debug!(path = %path_buf.display(), "loaded config");
        cfg.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.paths.home.as_os_str().is_empty() {
            return Err(Error::NoHomeDir);
        }
        Ok(self)
    }

    /// Defaults with every path under `root` and no size gates.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        Self {
            paths: PathsConfig::rooted_at(root),
            thresholds: Thresholds::none(),
            ..Self::default()
        }
    }
}
