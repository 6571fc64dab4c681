use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tidyarch",
    about = "An Arch Linux cleanup tool: find junk, review it, delete it with a snapshot first",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: ~/.config/tidyarch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not fetch the AUR package index; use the local cache if any
    #[arg(long, global = true)]
    pub offline: bool,

    /// Never offer a Timeshift snapshot before cleaning
    #[arg(long, global = true)]
    pub no_backup: bool,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan, pick items interactively, and clean them (default)
    Clean {
        /// Only run these checks (repeatable, e.g. --only trash)
        #[arg(long)]
        only: Vec<String>,
    },

    /// Scan and print what could be removed, without deleting anything
    Scan {
        /// Only run these checks (repeatable, e.g. --only trash)
        #[arg(long)]
        only: Vec<String>,
    },

    /// List the Timeshift snapshots this tool created
    Backups,
}
