use walkdir::WalkDir;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SizedPath};
use crate::errors::Result;

/// Suffixes pacman gives config files it could not merge.
const SUFFIXES: &[&str] = &[".pacnew", ".pacsave"];

/// Leftover `.pacnew` / `.pacsave` files. These usually want a diff before removal.
pub struct StaleConfigs;

impl Check for StaleConfigs {
    fn category(&self) -> Category {
        Category::StaleConfigFiles
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let root = &ctx.config.paths.config_root;
        if !root.is_dir() {
            return Ok(None);
        }

        let files: Vec<SizedPath> = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                SUFFIXES.iter().any(|s| name.ends_with(s))
            })
            .map(|e| {
                let size = e.metadata().map(|m| m.len()).unwrap_or(0);
                SizedPath::new(e.into_path(), size)
            })
            .collect();

        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        if total_bytes == 0 {
            return Ok(None);
        }

        let description = format!("Old pacman configs .pacnew/.pacsave ({} files)", files.len());
        Ok(Some(CleanupItem::new(
            Some(root.clone()),
            total_bytes,
            description,
            Payload::StaleConfigFiles { files },
        )))
    }
}
