use std::path::Path;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

const KIB: u64 = 1_024;
const MIB: u64 = 1_048_576;
const GIB: u64 = 1_073_741_824;
const TIB: u64 = 1_099_511_627_776;

/// Compute total size of a directory recursively.
///
/// Symlinks are neither counted nor descended into. Entries that vanish or
/// cannot be read contribute nothing.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Get size of a file or directory without following a symlink at `path`.
pub fn entry_size(path: &Path) -> u64 {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => dir_size(path),
        Ok(meta) if meta.is_file() => meta.len(),
        _ => 0,
    }
}

/// Remove a file, symlink or directory tree. Returns bytes freed on success.
/// A path that is already gone counts as removed.
pub fn safe_remove(path: &Path) -> std::io::Result<u64> {
    let meta = match path.symlink_metadata() {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        let size = dir_size(path);
        std::fs::remove_dir_all(path)?;
        Ok(size)
    } else {
        let size = if meta.is_file() { meta.len() } else { 0 };
        std::fs::remove_file(path)?;
        Ok(size)
    }
}

/// Remove everything inside `dir` but keep the directory itself.
/// Returns the number of children that could not be removed.
pub fn empty_dir(dir: &Path) -> std::io::Result<usize> {
    let mut failed = 0;
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(dir)?;
            return Ok(0);
        }
        Err(e) => return Err(e),
    };
    for entry in read_dir.flatten() {
        if let Err(e) = safe_remove(&entry.path()) {
            tracing::debug!(path = %entry.path().display(), error = %e, "could not remove");
            failed += 1;
        }
    }
    Ok(failed)
}

/// True if `path` was last modified more than `age` ago.
pub fn older_than(path: &Path, age: Duration, now: SystemTime) -> bool {
    let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    now.duration_since(modified)
        .map(|elapsed| elapsed > age)
        .unwrap_or(false)
}

/// Parse human-readable size string ("100MB", "1.2G", "512.0K") into bytes.
/// Multipliers are binary.
pub fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let unit_start = upper
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(upper.len());
    let (num_str, unit) = upper.split_at(unit_start);

    let multiplier = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => KIB,
        "M" | "MB" | "MIB" => MIB,
        "G" | "GB" | "GIB" => GIB,
        "T" | "TB" | "TIB" => TIB,
        other => return Err(format!("Unknown size unit: '{other}'")),
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    Ok((num * multiplier as f64) as u64)
}

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= TIB {
        format!("{:.2} TB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Shorten a path for display by replacing the home dir with ~.
pub fn display_path(path: &Path, home: &Path) -> String {
    if let Ok(relative) = path.strip_prefix(home) {
        format!("~/{}", relative.display())
    } else {
        path.display().to_string()
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dir_size_sums_nested_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
        fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
        fs::write(dir.path().join("x/b"), vec![0u8; 250]).unwrap();
        fs::write(dir.path().join("x/y/z/c"), vec![0u8; 4096]).unwrap();

        assert_eq!(dir_size(dir.path()), 100 + 250 + 4096);
    }

    #[cfg(unix)]
    #[test]
    fn dir_size_ignores_symlinks() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("big"), vec![0u8; 10_000]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("small"), vec![0u8; 10]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked_dir")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("big"), dir.path().join("linked_file"))
            .unwrap();

        assert_eq!(dir_size(dir.path()), 10);
    }

    #[test]
    fn dir_size_of_missing_path_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(dir_size(&dir.path().join("nope")), 0);
        assert_eq!(entry_size(&dir.path().join("nope")), 0);
    }

    #[cfg(unix)]
    #[test]
    fn dir_size_skips_unreadable_subtree() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("visible"), vec![0u8; 64]).unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden"), vec![0u8; 1000]).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let size = dir_size(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root can read through 0o000, so only the lower bound is fixed.
        assert!(size == 64 || size == 1064);
    }

    #[test]
    fn safe_remove_handles_files_dirs_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"hello").unwrap();
        let sub = dir.path().join("d");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("inner"), vec![1u8; 20]).unwrap();

        assert_eq!(safe_remove(&file).unwrap(), 5);
        assert_eq!(safe_remove(&sub).unwrap(), 20);
        assert_eq!(safe_remove(&file).unwrap(), 0);
        assert!(!sub.exists());
    }

    #[test]
    fn empty_dir_keeps_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("files");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("a"), b"x").unwrap();

        assert_eq!(empty_dir(&target).unwrap(), 0);
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn parse_size_accepts_journal_and_long_units() {
        assert_eq!(parse_size("512.0K").unwrap(), 512 * KIB);
        assert_eq!(parse_size("24.0M").unwrap(), 24 * MIB);
        assert_eq!(parse_size("1.5G").unwrap(), GIB + GIB / 2);
        assert_eq!(parse_size("100MB").unwrap(), 100 * MIB);
        assert_eq!(parse_size("8B").unwrap(), 8);
        assert_eq!(parse_size("42").unwrap(), 42);
        assert!(parse_size("12Q").is_err());
        assert!(parse_size("abcM").is_err());
    }

    #[test]
    fn format_size_picks_largest_unit() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * MIB), "3.00 MB");
        assert_eq!(format_size(GIB + GIB / 4), "1.25 GB");
    }

    #[test]
    fn display_path_abbreviates_home() {
        let home = Path::new("/home/user");
        assert_eq!(
            display_path(Path::new("/home/user/.cache/pip"), home),
            "~/.cache/pip"
        );
        assert_eq!(display_path(Path::new("/etc/foo"), home), "/etc/foo");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
