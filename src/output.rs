use std::io::{self, Write};

use colored::Colorize;

use crate::backup::Snapshot;
use crate::cleaner::CleanupItem;
use crate::utils::{format_size, truncate};

pub fn print_banner() {
    println!(
        "{}",
        format!("tidyarch - Arch Linux Cleanup Tool v{}", env!("CARGO_PKG_VERSION"))
            .bold()
            .cyan()
    );
}

pub fn print_backup_status(available: bool, existing: usize) {
    if available {
        println!(
            "{} Ready | {}",
            "Timeshift:".green().bold(),
            format!("Backups: {existing}").dimmed()
        );
    } else {
        println!(
            "{} Not installed {}",
            "Timeshift:".yellow().bold(),
            "(sudo pacman -S timeshift)".dimmed()
        );
    }
}

pub fn print_log_location(path: &str) {
    println!("{} {}", "Logs:".yellow(), path.dimmed());
    println!();
}

pub fn print_scan_step(step: usize, total: usize, label: &str) {
    println!("  {} {}", format!("[{}/{}]", step + 1, total).dimmed(), label.cyan());
}

pub fn print_system_clean() {
    println!();
    println!("{}", "System is clean! Nothing to remove.".green().bold());
}

/// Result header plus one row per item.
pub fn write_results(out: &mut impl Write, items: &[CleanupItem]) -> io::Result<()> {
    let total: u64 = items.iter().map(|i| i.estimated_bytes).sum();
    let safe = items.iter().filter(|i| i.safe).count();

    writeln!(out)?;
    writeln!(
        out,
        "{} | {} | {}",
        "RESULTS".bold().cyan(),
        format!("{} items", items.len()).cyan(),
        format_size(total).green()
    )?;
    writeln!(
        out,
        "{} | {}",
        format!("Safe: {safe}").green(),
        format!("Review: {}", items.len() - safe).yellow()
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "  {:>3}  {:<20} {:<50} {:>12}  {}",
        "#".bold(),
        "Category".bold(),
        "Description".bold(),
        "Size".bold(),
        "Safe".bold()
    )?;
    writeln!(out, "  {}", "─".repeat(96).dimmed())?;

    for (idx, item) in items.iter().enumerate() {
        let marker = if item.safe {
            "safe".green()
        } else {
            "review".red()
        };
        writeln!(
            out,
            "  {:>3}  {:<20} {:<50} {:>12}  {}",
            idx + 1,
            item.category().label().cyan(),
            truncate(&item.description, 50),
            format_size(item.estimated_bytes).green(),
            marker
        )?;
    }
    writeln!(out)
}

pub fn write_menu(out: &mut impl Write, selected: usize, total: usize) -> io::Result<()> {
    writeln!(out, "{}", "OPTIONS".bold().cyan())?;
    writeln!(
        out,
        "{} Auto-select safe  |  {} Continue  |  {} Details  |  {} Toggle  |  {} Help  |  {} Quit",
        "a".green(),
        "c".green(),
        format!("1-{total}").yellow(),
        "t<N>".yellow(),
        "h".green(),
        "q".green()
    )?;
    writeln!(out, "{}", format!("Selected: {selected}/{total}").dimmed())?;
    write!(out, "{} ", "→".bold().cyan())?;
    out.flush()
}

pub fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "HELP".bold().cyan())?;
    writeln!(out)?;
    writeln!(out, "{}", "Safe items, fine to delete without review:".green())?;
    for line in [
        "Package cache     old package archives (keeps the newest versions)",
        "Package downloads leftover download-* staging folders",
        "Orphaned packages packages nothing depends on any more",
        "Journal logs      systemd journal (keeps the last 30 days)",
        "User/build caches npm, cargo, pip, go and maven caches",
        "Broken symlinks   links pointing at deleted files",
        "Trash, thumbnails the trash bin and image thumbnail cache",
        "Temp files        stale recently-used and Xauthority backups",
    ] {
        writeln!(out, "  • {line}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "Items needing review:".red())?;
    for line in [
        "Old configs       .pacnew/.pacsave files, diff them first",
        "Duplicates        extra copies; the first copy is kept",
        "/etc orphans      config dirs no package claims",
    ] {
        writeln!(out, "  • {line}")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Press {} to select every safe item, a number to inspect and toggle one item,",
        "a".green()
    )?;
    writeln!(
        out,
        "{} to flip one item directly, then {} to continue.",
        "t<N>".yellow(),
        "c".green()
    )?;
    writeln!(out, "A Timeshift snapshot is offered before anything is deleted.")?;
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        "Ctrl-C at a prompt takes effect once Enter is pressed; press it twice to quit at once."
            .dimmed()
    )?;
    writeln!(out)
}

pub fn write_final_confirmation(out: &mut impl Write, items: &[CleanupItem]) -> io::Result<()> {
    let total: u64 = items.iter().map(|i| i.estimated_bytes).sum();
    writeln!(out)?;
    writeln!(out, "{}", "FINAL CONFIRMATION".red().bold())?;
    writeln!(out, "{}", format!("Items: {}", items.len()).yellow())?;
    writeln!(
        out,
        "{}",
        format!("Space to free: {}", format_size(total)).green().bold()
    )?;

    let unsafe_items: Vec<_> = items.iter().filter(|i| !i.safe).collect();
    if !unsafe_items.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "NON-SAFE ITEMS (review):".red().bold())?;
        for item in unsafe_items {
            writeln!(out, "  • {}", item.description)?;
        }
    }
    writeln!(out)
}

pub fn print_item_outcome(description: &str, ok: bool) {
    if ok {
        println!("  {} {}", "✓".green(), description);
    } else {
        println!("  {} {}", "✗".red().bold(), description);
    }
}

pub fn print_clean_complete(succeeded: usize, failed: usize, log_path: &str) {
    println!();
    if failed == 0 {
        println!("{}", format!("Cleanup completed! {succeeded} items cleaned.").green().bold());
    } else {
        println!(
            "{} {}",
            format!("Cleanup completed with errors: {succeeded} ok,").yellow().bold(),
            format!("{failed} failed.").red().bold()
        );
    }
    println!("{}", format!("Log saved to: {log_path}").dimmed());
}

pub fn print_free_space(label: &str, available: u64) {
    println!("  {:<20} {}", label, format_size(available).green());
}

pub fn print_backups(snapshots: &[Snapshot]) {
    if snapshots.is_empty() {
        print_info("No tidyarch snapshots found.");
        return;
    }
    println!("{}", "=== Tagged snapshots ===".bold().white());
    for snap in snapshots {
        println!(
            "  {:<24} {}  {}",
            snap.name.cyan(),
            snap.date.dimmed(),
            snap.description
        );
    }
    println!();
}

pub fn print_separator() {
    println!("  {}", "─".repeat(45).dimmed());
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "Warning:".red().bold(), msg.red());
}

pub fn print_info(msg: &str) {
    println!("{} {}", "Info:".cyan().bold(), msg);
}

pub fn print_cancelled() {
    println!("{}", "Cancelled".yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg.red());
}

pub fn print_done() {
    println!("{}", "Done!".dimmed());
}
