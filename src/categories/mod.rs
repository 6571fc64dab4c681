mod broken_symlinks;
mod build_caches;
mod duplicates;
mod etc_orphans;
mod journal;
mod orphans;
mod pacman_cache;
mod stale_configs;
mod temp_files;
mod trash;
mod user_cache;

use crate::cleaner::Check;

/// Every check, in the order results are presented.
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(pacman_cache::PackageCache),
        Box::new(pacman_cache::TempDownloads),
        Box::new(orphans::OrphanedPackages),
        Box::new(journal::JournalLogs),
        Box::new(user_cache::UserCache),
        Box::new(build_caches::BuildCaches),
        Box::new(broken_symlinks::BrokenSymlinks),
        Box::new(stale_configs::StaleConfigs),
        Box::new(duplicates::DuplicateFinder),
        Box::new(etc_orphans::EtcOrphans),
        Box::new(trash::Trash),
        Box::new(trash::Thumbnails),
        Box::new(temp_files::TempFiles),
    ]
}

pub fn find_check(name: &str) -> Option<Box<dyn Check>> {
    all_checks().into_iter().find(|c| c.name() == name)
}

#[cfg(test)]
pub mod testutil {
    use std::fs;
    use std::time::SystemTime;

    use tempfile::TempDir;

    use crate::cleaner::ScanContext;
    use crate::command::fake::FakeRunner;
    use crate::config::Config;
    use crate::packages::PackageInventory;

    /// A throwaway filesystem root with every configured path inside it.
    pub struct Fixture {
        _dir: TempDir,
        pub config: Config,
        pub runner: FakeRunner,
        pub inventory: PackageInventory,
        pub now: SystemTime,
    }

    impl Fixture {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config::for_root(dir.path());
            for path in [
                &config.paths.home,
                &config.paths.cache_root,
                &config.paths.pacman_cache,
                &config.paths.config_root,
            ] {
                fs::create_dir_all(path).unwrap();
            }
            Self {
                _dir: dir,
                config,
                runner: FakeRunner::new(),
                inventory: PackageInventory::default(),
                now: SystemTime::now(),
            }
        }

        pub fn ctx(&self) -> ScanContext<'_> {
            ScanContext {
                config: &self.config,
                runner: &self.runner,
                inventory: &self.inventory,
                now: self.now,
            }
        }
    }
}
