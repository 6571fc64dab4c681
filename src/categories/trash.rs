use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext};
use crate::errors::Result;
use crate::utils;

/// The freedesktop trash under `~/.local/share/Trash`.
pub struct Trash;

impl Check for Trash {
    fn category(&self) -> Category {
        Category::Trash
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let dir = &ctx.config.paths.trash;
        if !dir.is_dir() {
            return Ok(None);
        }

        let size = utils::dir_size(dir);
        if size <= ctx.config.thresholds.trash {
            return Ok(None);
        }

        Ok(Some(CleanupItem::new(
            Some(dir.clone()),
            size,
            "Trash bin",
            Payload::Trash { dir: dir.clone() },
        )))
    }
}

pub struct Thumbnails;

impl Check for Thumbnails {
    fn category(&self) -> Category {
        Category::Thumbnails
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let dir = ctx.config.paths.cache_root.join("thumbnails");
        if !dir.is_dir() {
            return Ok(None);
        }

        let size = utils::dir_size(&dir);
        if size <= ctx.config.thresholds.thumbnails {
            return Ok(None);
        }

        Ok(Some(CleanupItem::new(
            Some(dir.clone()),
            size,
            "Image thumbnails cache",
            Payload::Thumbnails { dir },
        )))
    }
}
