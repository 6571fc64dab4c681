use crate::cleaner::{Category, Check, CleanupItem, OrphanPackage, Payload, ScanContext};
use crate::errors::Result;
use crate::packages::Pacman;

/// Packages pulled in as dependencies that nothing needs any more.
///
/// Their size is a flat per-package guess; the real figure would cost one
/// more pacman query per package.
pub struct OrphanedPackages;

impl Check for OrphanedPackages {
    fn category(&self) -> Category {
        Category::OrphanedPackages
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let pacman = Pacman::new(ctx.runner);
        let names = pacman.orphans()?;
        if names.is_empty() {
            return Ok(None);
        }

        let packages: Vec<OrphanPackage> = names
            .into_iter()
            .map(|name| {
                let mut depends_on: Vec<String> =
                    pacman.dependencies_of(&name).into_iter().collect();
                depends_on.sort();
                OrphanPackage { name, depends_on }
            })
            .collect();

        let estimate = packages.len() as u64 * ctx.config.packages.orphan_estimate_bytes;
        let description = format!("Orphaned packages ({} items)", packages.len());
        Ok(Some(CleanupItem::new(
            None,
            estimate,
            description,
            Payload::OrphanedPackages { packages },
        )))
    }
}
