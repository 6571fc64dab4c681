use std::io::{BufRead, Write};
use std::path::Path;

use colored::Colorize;

use crate::cleaner::{CleanupItem, Payload};
use crate::errors::{Error, Result};
use crate::interrupt::Interrupt;
use crate::output;
use crate::utils::{display_path, format_size};

/// Which items the user has marked, parallel to the scan result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    marked: Vec<bool>,
}

impl Selection {
    pub fn new(len: usize) -> Self {
        Self {
            marked: vec![false; len],
        }
    }

    /// Replace the selection with exactly the safe items. Returns how many.
    pub fn select_safe(&mut self, items: &[CleanupItem]) -> usize {
        for (mark, item) in self.marked.iter_mut().zip(items) {
            *mark = item.safe;
        }
        self.count()
    }

    pub fn set(&mut self, idx: usize, selected: bool) {
        if let Some(mark) = self.marked.get_mut(idx) {
            *mark = selected;
        }
    }

    pub fn toggle(&mut self, idx: usize) {
        if let Some(mark) = self.marked.get_mut(idx) {
            *mark = !*mark;
        }
    }

    pub fn is_selected(&self, idx: usize) -> bool {
        self.marked.get(idx).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.marked.iter().filter(|m| **m).count()
    }

    /// Selected items in their original order.
    pub fn chosen(&self, items: &[CleanupItem]) -> Vec<CleanupItem> {
        items
            .iter()
            .zip(&self.marked)
            .filter(|(_, m)| **m)
            .map(|(item, _)| item.clone())
            .collect()
    }
}

/// What the detail view asks the selection loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailDecision {
    Unchanged,
    Set(bool),
}

fn read_command(input: &mut impl BufRead, interrupt: &Interrupt) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| Error::io("<stdin>", e))?;
    interrupt.check()?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

/// Ask a yes/no question; an empty answer takes `default`.
pub fn confirm(
    input: &mut impl BufRead,
    out: &mut impl Write,
    interrupt: &Interrupt,
    question: &str,
    default: bool,
) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    write!(out, "{} {} ", question.bold().cyan(), hint.dimmed()).map_err(stdout_err)?;
    out.flush().map_err(stdout_err)?;

    let Some(answer) = read_command(input, interrupt)? else {
        return Ok(false);
    };
    Ok(match answer.as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}

fn stdout_err(e: std::io::Error) -> Error {
    Error::io("<stdout>", e)
}

const SHOW_PACKAGES: usize = 20;
const SHOW_LINKS: usize = 20;
const SHOW_FILES: usize = 15;
const SHOW_DIRS: usize = 10;

fn list_with_more<T>(
    lines: &mut Vec<String>,
    entries: &[T],
    limit: usize,
    render: impl Fn(&T) -> String,
) {
    for entry in entries.iter().take(limit) {
        lines.push(format!("  • {}", render(entry)));
    }
    if entries.len() > limit {
        lines.push(format!("  ... and {} more", entries.len() - limit));
    }
}

/// Plain-text description of exactly what deleting `item` would touch.
pub fn detail_lines(item: &CleanupItem, home: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let show = |p: &Path| display_path(p, home);

    match &item.payload {
        Payload::PackageCache {
            archives,
            keep_versions,
        } => {
            lines.push(format!("Old archives: {}", archives.len()));
            lines.push(format!("Keeping: {keep_versions} newest versions per package"));
            lines.push("Largest archives:".to_string());
            let mut largest: Vec<_> = archives.iter().collect();
            largest.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
            list_with_more(&mut lines, &largest, SHOW_DIRS, |a| {
                let name = a
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{name}: {}", format_size(a.size_bytes))
            });
        }
        Payload::PackageTempDownloads { dirs } => {
            lines.push("Download staging folders:".to_string());
            list_with_more(&mut lines, dirs, SHOW_FILES, |d| show(d.as_path()));
        }
        Payload::OrphanedPackages { packages } => {
            lines.push("Orphaned packages to remove:".to_string());
            list_with_more(&mut lines, packages, SHOW_PACKAGES, |p| {
                if p.depends_on.is_empty() {
                    p.name.clone()
                } else {
                    format!("{} (depends on: {})", p.name, p.depends_on.join(", "))
                }
            });
        }
        Payload::JournalLogs { retain_days } => {
            lines.push(format!(
                "Journal entries older than {retain_days} days are vacuumed."
            ));
        }
        Payload::UserCacheDir { dirs } => {
            lines.push("Cache directories:".to_string());
            list_with_more(&mut lines, dirs, SHOW_DIRS, |d| {
                format!("{}: {}", show(d.path.as_path()), format_size(d.size_bytes))
            });
        }
        Payload::BuildCache { caches } => {
            lines.push("Build caches:".to_string());
            list_with_more(&mut lines, caches, SHOW_DIRS, |c| {
                format!("{}: {}", c.name, format_size(c.size_bytes))
            });
        }
        Payload::BrokenSymlinks { links } => {
            lines.push("Broken symlinks:".to_string());
            list_with_more(&mut lines, links, SHOW_LINKS, |l| show(l.as_path()));
        }
        Payload::StaleConfigFiles { files } => {
            lines.push(".pacnew/.pacsave files:".to_string());
            list_with_more(&mut lines, files, SHOW_FILES, |f| show(f.path.as_path()));
        }
        Payload::DuplicateFiles { files } => {
            lines.push("Duplicate files (the first copy is kept):".to_string());
            list_with_more(&mut lines, files, SHOW_FILES, |f| {
                format!(
                    "{} ({}) = {}",
                    show(f.path.as_path()),
                    format_size(f.size_bytes),
                    show(f.original.as_path())
                )
            });
        }
        Payload::OrphanedConfigDirs { dirs } => {
            lines.push("REVIEW CAREFULLY!".to_string());
            lines.push("Potentially orphaned /etc directories:".to_string());
            list_with_more(&mut lines, dirs, SHOW_DIRS, |d| {
                let name = d
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{name}: {}", format_size(d.size_bytes))
            });
        }
        Payload::Trash { dir } => {
            lines.push(format!("Empties files/ and info/ in {}", show(dir.as_path())));
        }
        Payload::Thumbnails { dir } => {
            lines.push(format!("Removes and recreates {}", show(dir.as_path())));
        }
        Payload::StaleTempFiles { files } => {
            lines.push("Temporary files:".to_string());
            list_with_more(&mut lines, files, SHOW_FILES, |f| {
                format!("{} ({})", show(f.path.as_path()), format_size(f.size_bytes))
            });
        }
    }

    lines
}

/// Show one item until the user goes back. `s` flips the pending selection.
pub fn show_detail(
    item: &CleanupItem,
    selected: bool,
    home: &Path,
    input: &mut impl BufRead,
    out: &mut impl Write,
    interrupt: &Interrupt,
) -> Result<DetailDecision> {
    let mut pending = selected;

    loop {
        let safety = if item.safe {
            "SAFE".green()
        } else {
            "REVIEW".red()
        };
        let status = if pending {
            "✓ SELECTED".green()
        } else {
            "○ NOT SELECTED".yellow()
        };

        let mut text = format!(
            "\n{}\n{}\n{}\n{} {}\n\n",
            item.description.bold().cyan(),
            format!("Size: {}", format_size(item.estimated_bytes)).yellow(),
            format!("Type: {}", item.category().name()).cyan(),
            safety,
            status
        );
        text.push_str(&format!("{}\n", "What will be deleted".bold().cyan()));
        for line in detail_lines(item, home) {
            text.push_str(&line);
            text.push('\n');
        }
        text.push_str(&format!(
            "\n{} Toggle selection  |  {} Back to menu\n",
            "s".green(),
            "Enter".green()
        ));
        out.write_all(text.as_bytes()).map_err(stdout_err)?;
        out.flush().map_err(stdout_err)?;

        match read_command(input, interrupt)?.as_deref() {
            Some("s") => pending = !pending,
            _ => break,
        }
    }

    Ok(if pending == selected {
        DetailDecision::Unchanged
    } else {
        DetailDecision::Set(pending)
    })
}

/// Interactive selection. Returns the chosen items in scan order; an empty
/// list means the user quit.
pub fn select_items(
    items: &[CleanupItem],
    home: &Path,
    input: &mut impl BufRead,
    out: &mut impl Write,
    interrupt: &Interrupt,
) -> Result<Vec<CleanupItem>> {
    let mut selection = Selection::new(items.len());

    loop {
        output::write_results(out, items).map_err(stdout_err)?;
        output::write_menu(out, selection.count(), items.len()).map_err(stdout_err)?;

        let Some(choice) = read_command(input, interrupt)? else {
            return Ok(Vec::new());
        };

        let message = match choice.as_str() {
            "q" => {
                writeln!(out, "{}", "Cancelled by user".yellow()).map_err(stdout_err)?;
                return Ok(Vec::new());
            }
            "a" => match selection.select_safe(items) {
                0 => "No safe items available".yellow(),
                n => format!("Selected {n} safe items").green(),
            },
            "c" => {
                if selection.count() > 0 {
                    return Ok(selection.chosen(items));
                }
                "Select items first (press 'a' or a number to view and select)".yellow()
            }
            "h" => {
                output::write_help(out).map_err(stdout_err)?;
                continue;
            }
            other if other.starts_with('t') => match other[1..].trim().parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => {
                    let idx = n - 1;
                    selection.toggle(idx);
                    if selection.is_selected(idx) {
                        format!("Selected: {}", items[idx].description).green()
                    } else {
                        format!("Deselected: {}", items[idx].description).yellow()
                    }
                }
                Ok(_) => format!("Invalid number (1-{})", items.len()).red(),
                Err(_) => "Invalid input".red(),
            },
            other => match other.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => {
                    let idx = n - 1;
                    let decision = show_detail(
                        &items[idx],
                        selection.is_selected(idx),
                        home,
                        input,
                        out,
                        interrupt,
                    )?;
                    if let DetailDecision::Set(selected) = decision {
                        selection.set(idx, selected);
                    }
                    continue;
                }
                Ok(_) => format!("Invalid number (1-{})", items.len()).red(),
                Err(_) => "Invalid input".red(),
            },
        };
        writeln!(out, "{message}").map_err(stdout_err)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{DuplicateFile, OrphanPackage, SizedPath};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn trash(desc: &str) -> CleanupItem {
        CleanupItem::new(None, 10, desc, Payload::Trash { dir: PathBuf::from("/t") })
    }

    fn dupes(desc: &str) -> CleanupItem {
        CleanupItem::new(None, 10, desc, Payload::DuplicateFiles { files: vec![] })
    }

    fn descriptions(items: &[CleanupItem]) -> Vec<&str> {
        items.iter().map(|i| i.description.as_str()).collect()
    }

    fn drive(items: &[CleanupItem], script: &str) -> (Vec<CleanupItem>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let home = Path::new("/home/u");
        let chosen = select_items(items, home, &mut input, &mut out, &Interrupt::new()).unwrap();
        (chosen, String::from_utf8(out).unwrap())
    }

    #[test]
    fn bulk_select_takes_exactly_the_safe_items_in_order() {
        let items = vec![dupes("d1"), trash("t1"), dupes("d2"), trash("t2"), trash("t3")];
        let mut selection = Selection::new(items.len());
        selection.toggle(0);
        assert_eq!(selection.select_safe(&items), 3);
        assert_eq!(descriptions(&selection.chosen(&items)), vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn bulk_select_with_no_safe_items_selects_nothing() {
        let items = vec![dupes("d1"), dupes("d2")];
        let mut selection = Selection::new(items.len());
        assert_eq!(selection.select_safe(&items), 0);
        assert!(selection.chosen(&items).is_empty());
    }

    #[test]
    fn auto_select_then_continue() {
        let items = vec![trash("t1"), dupes("d1")];
        let (chosen, text) = drive(&items, "a\nc\n");
        assert_eq!(descriptions(&chosen), vec!["t1"]);
        assert!(text.contains("Selected 1 safe items"));
    }

    #[test]
    fn continue_without_selection_asks_again() {
        let items = vec![trash("t1")];
        let (chosen, text) = drive(&items, "c\nq\n");
        assert!(chosen.is_empty());
        assert!(text.contains("Select items first"));
    }

    #[test]
    fn detail_view_toggles_an_unsafe_item() {
        let items = vec![trash("t1"), dupes("d1")];
        // open item 2, toggle, go back, continue
        let (chosen, text) = drive(&items, "2\ns\n\nc\n");
        assert_eq!(descriptions(&chosen), vec!["d1"]);
        assert!(text.contains("✓ SELECTED"));
    }

    #[test]
    fn toggling_twice_leaves_selection_unchanged() {
        let item = trash("t1");
        let mut input = Cursor::new(b"s\ns\n\n".to_vec());
        let mut out = Vec::new();
        let interrupt = Interrupt::new();
        let decision =
            show_detail(&item, true, Path::new("/"), &mut input, &mut out, &interrupt).unwrap();
        assert_eq!(decision, DetailDecision::Unchanged);
    }

    #[test]
    fn bad_input_and_eof_end_in_cancel() {
        let items = vec![trash("t1")];
        let (chosen, text) = drive(&items, "9\nzzz\n");
        assert!(chosen.is_empty());
        assert!(text.contains("Invalid number (1-1)"));
        assert!(text.contains("Invalid input"));
    }

    #[test]
    fn toggle_command_flips_one_item_without_the_detail_view() {
        let items = vec![trash("t1"), dupes("d1"), trash("t2")];
        // pick the unsafe one, pick and drop the last one, continue
        let (chosen, text) = drive(&items, "t2\nt3\nt3\nc\n");
        assert_eq!(descriptions(&chosen), vec!["d1"]);
        assert!(text.contains("Selected: d1"));
        assert!(text.contains("Deselected: t2"));
        assert!(!text.contains("What will be deleted"));
    }

    #[test]
    fn toggle_command_rejects_out_of_range() {
        let (chosen, text) = drive(&[trash("t1")], "t5\ntx\nq\n");
        assert!(chosen.is_empty());
        assert!(text.contains("Invalid number (1-1)"));
        assert!(text.contains("Invalid input"));
    }

    #[test]
    fn help_is_printed_on_request() {
        let (_, text) = drive(&[trash("t1")], "h\nq\n");
        assert!(text.contains("Items needing review"));
        assert!(text.contains("Ctrl-C at a prompt takes effect once Enter is pressed"));
    }

    #[test]
    fn interrupt_during_prompt_aborts() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut input = Cursor::new(b"a\n".to_vec());
        let mut out = Vec::new();
        let err = select_items(&[trash("t")], Path::new("/"), &mut input, &mut out, &interrupt)
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[test]
    fn confirm_uses_default_on_empty_answer() {
        let interrupt = Interrupt::new();
        let mut out = Vec::new();
        let mut yes = Cursor::new(b"\n".to_vec());
        assert!(confirm(&mut yes, &mut out, &interrupt, "Backup?", true).unwrap());
        let mut no = Cursor::new(b"\n".to_vec());
        assert!(!confirm(&mut no, &mut out, &interrupt, "Proceed?", false).unwrap());
        let mut explicit = Cursor::new(b"Y\n".to_vec());
        assert!(confirm(&mut explicit, &mut out, &interrupt, "Proceed?", false).unwrap());
    }

    #[test]
    fn detail_lines_cover_payload_contents() {
        let home = Path::new("/home/u");
        let orphans = CleanupItem::new(
            None,
            0,
            "Orphaned packages (1 items)",
            Payload::OrphanedPackages {
                packages: vec![OrphanPackage {
                    name: "libfoo".to_string(),
                    depends_on: vec!["glibc".to_string()],
                }],
            },
        );
        assert!(detail_lines(&orphans, home)
            .iter()
            .any(|l| l == "  • libfoo (depends on: glibc)"));

        let files: Vec<DuplicateFile> = (0..17)
            .map(|i| DuplicateFile {
                path: home.join(format!("Downloads/f{i}")),
                size_bytes: 2048,
                original: home.join("Downloads/orig"),
            })
            .collect();
        let dup = CleanupItem::new(None, 0, "Duplicate files", Payload::DuplicateFiles { files });
        let lines = detail_lines(&dup, home);
        assert!(lines.contains(&"  • ~/Downloads/f0 (2.00 KB) = ~/Downloads/orig".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  ... and 2 more"));

        let etc = CleanupItem::new(
            None,
            0,
            "etc",
            Payload::OrphanedConfigDirs {
                dirs: vec![SizedPath::new(PathBuf::from("/etc/ghost"), 1024)],
            },
        );
        assert!(detail_lines(&etc, home).contains(&"  • ghost: 1.00 KB".to_string()));
    }
}
