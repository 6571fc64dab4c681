use std::path::PathBuf;
use std::time::SystemTime;

use crate::command::CommandRunner;
use crate::config::Config;
use crate::errors::Result;
use crate::packages::PackageInventory;

/// The fixed set of things the scanner knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    PackageCache,
    PackageTempDownloads,
    OrphanedPackages,
    JournalLogs,
    UserCacheDir,
    BuildCache,
    BrokenSymlinks,
    StaleConfigFiles,
    DuplicateFiles,
    OrphanedConfigDirs,
    Trash,
    Thumbnails,
    StaleTempFiles,
}

impl Category {
    /// Machine-readable name (e.g. "package-cache").
    pub fn name(self) -> &'static str {
        match self {
            Self::PackageCache => "package-cache",
            Self::PackageTempDownloads => "package-temp-downloads",
            Self::OrphanedPackages => "orphaned-packages",
            Self::JournalLogs => "journal-logs",
            Self::UserCacheDir => "user-cache-dir",
            Self::BuildCache => "build-cache",
            Self::BrokenSymlinks => "broken-symlinks",
            Self::StaleConfigFiles => "stale-config-files",
            Self::DuplicateFiles => "duplicate-files",
            Self::OrphanedConfigDirs => "orphaned-config-dirs",
            Self::Trash => "trash",
            Self::Thumbnails => "thumbnails",
            Self::StaleTempFiles => "stale-temp-files",
        }
    }

    /// Human-readable label for display (e.g. "Package Cache").
    pub fn label(self) -> &'static str {
        match self {
            Self::PackageCache => "Package Cache",
            Self::PackageTempDownloads => "Package Downloads",
            Self::OrphanedPackages => "Orphaned Packages",
            Self::JournalLogs => "Journal Logs",
            Self::UserCacheDir => "User Caches",
            Self::BuildCache => "Build Caches",
            Self::BrokenSymlinks => "Broken Symlinks",
            Self::StaleConfigFiles => "Old Configs",
            Self::DuplicateFiles => "Duplicate Files",
            Self::OrphanedConfigDirs => "Orphaned /etc Dirs",
            Self::Trash => "Trash",
            Self::Thumbnails => "Thumbnails",
            Self::StaleTempFiles => "Temp Files",
        }
    }

    /// Whether items of this category may be deleted without review.
    pub fn is_safe(self) -> bool {
        !matches!(
            self,
            Self::StaleConfigFiles | Self::DuplicateFiles | Self::OrphanedConfigDirs
        )
    }

    /// Whether removed content can come back through regeneration.
    pub fn is_reversible(self) -> bool {
        matches!(
            self,
            Self::UserCacheDir
                | Self::BuildCache
                | Self::BrokenSymlinks
                | Self::DuplicateFiles
                | Self::Thumbnails
                | Self::StaleTempFiles
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizedPath {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SizedPath {
    pub fn new(path: PathBuf, size_bytes: u64) -> Self {
        Self { path, size_bytes }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrphanPackage {
    pub name: String,
    pub depends_on: Vec<String>,
}

/// One well-known build tool cache inside a `BuildCache` item.
#[derive(Debug, Clone, PartialEq)]
pub struct SubCache {
    pub name: &'static str,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// The first copy seen, which is kept.
    pub original: PathBuf,
}

/// Everything needed to show and delete an item, per category.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    PackageCache {
        archives: Vec<SizedPath>,
        keep_versions: usize,
    },
    PackageTempDownloads {
        dirs: Vec<PathBuf>,
    },
    OrphanedPackages {
        packages: Vec<OrphanPackage>,
    },
    JournalLogs {
        retain_days: u32,
    },
    UserCacheDir {
        dirs: Vec<SizedPath>,
    },
    BuildCache {
        caches: Vec<SubCache>,
    },
    BrokenSymlinks {
        links: Vec<PathBuf>,
    },
    StaleConfigFiles {
        files: Vec<SizedPath>,
    },
    DuplicateFiles {
        files: Vec<DuplicateFile>,
    },
    OrphanedConfigDirs {
        dirs: Vec<SizedPath>,
    },
    Trash {
        dir: PathBuf,
    },
    Thumbnails {
        dir: PathBuf,
    },
    StaleTempFiles {
        files: Vec<SizedPath>,
    },
}

impl Payload {
    pub fn category(&self) -> Category {
        match self {
            Self::PackageCache { .. } => Category::PackageCache,
            Self::PackageTempDownloads { .. } => Category::PackageTempDownloads,
            Self::OrphanedPackages { .. } => Category::OrphanedPackages,
            Self::JournalLogs { .. } => Category::JournalLogs,
            Self::UserCacheDir { .. } => Category::UserCacheDir,
            Self::BuildCache { .. } => Category::BuildCache,
            Self::BrokenSymlinks { .. } => Category::BrokenSymlinks,
            Self::StaleConfigFiles { .. } => Category::StaleConfigFiles,
            Self::DuplicateFiles { .. } => Category::DuplicateFiles,
            Self::OrphanedConfigDirs { .. } => Category::OrphanedConfigDirs,
            Self::Trash { .. } => Category::Trash,
            Self::Thumbnails { .. } => Category::Thumbnails,
            Self::StaleTempFiles { .. } => Category::StaleTempFiles,
        }
    }
}

/// One candidate for removal found during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupItem {
    /// Where the item lives; `None` for things without a single root, like packages.
    pub root: Option<PathBuf>,
    pub estimated_bytes: u64,
    pub description: String,
    pub safe: bool,
    pub reversible: bool,
    pub payload: Payload,
}

impl CleanupItem {
    /// Build an item with the category's default safety classification.
    pub fn new(
        root: Option<PathBuf>,
        estimated_bytes: u64,
        description: impl Into<String>,
        payload: Payload,
    ) -> Self {
        let category = payload.category();
        Self {
            root,
            estimated_bytes,
            description: description.into(),
            safe: category.is_safe(),
            reversible: category.is_reversible(),
            payload,
        }
    }

    pub fn category(&self) -> Category {
        self.payload.category()
    }
}

/// Shared, read-only state every check sees.
pub struct ScanContext<'a> {
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub inventory: &'a PackageInventory,
    pub now: SystemTime,
}

/// The trait every check module implements.
pub trait Check {
    fn category(&self) -> Category;

    fn name(&self) -> &'static str {
        self.category().name()
    }

    fn label(&self) -> &'static str {
        self.category().label()
    }

    /// Look for something to clean. Never deletes anything.
    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>>;
}

/// Every category name, for `--help` style listings.
pub fn all_category_names() -> Vec<&'static str> {
    ALL_CATEGORIES.iter().map(|c| c.name()).collect()
}

pub const ALL_CATEGORIES: [Category; 13] = [
    Category::PackageCache,
    Category::PackageTempDownloads,
    Category::OrphanedPackages,
    Category::JournalLogs,
    Category::UserCacheDir,
    Category::BuildCache,
    Category::BrokenSymlinks,
    Category::StaleConfigFiles,
    Category::DuplicateFiles,
    Category::OrphanedConfigDirs,
    Category::Trash,
    Category::Thumbnails,
    Category::StaleTempFiles,
];
