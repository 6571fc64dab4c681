mod backup;
mod categories;
mod cleaner;
mod cli;
mod command;
mod config;
mod disk_info;
mod errors;
mod executor;
mod hasher;
mod interrupt;
mod oplog;
mod output;
mod packages;
mod remote_index;
mod scanner;
mod selector;
mod session;
mod utils;

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::command::SystemRunner;
use crate::config::Config;
use crate::errors::Result;
use crate::interrupt::Interrupt;
use crate::session::{Session, SessionOptions};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, config: &Config, interrupt: &Interrupt) -> Result<()> {
    let runner = SystemRunner::new();
    let options = SessionOptions {
        offline: cli.global.offline,
        no_backup: cli.global.no_backup,
    };
    let session = Session::new(config, &runner, interrupt, options);

    let stdin = io::stdin();
    let stdout = io::stdout();
    match cli.command.unwrap_or(Command::Clean { only: Vec::new() }) {
        Command::Clean { only } => session.run_clean(&only, &mut stdin.lock(), &mut stdout.lock()),
        Command::Scan { only } => session.run_scan(&only, &mut stdout.lock()),
        Command::Backups => {
            session.list_backups();
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = match Config::load(cli.global.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&e.to_string());
            output::print_done();
            return;
        }
    };

    let interrupt = Interrupt::install();
    let log = oplog::OperationLog::new(config.paths.operation_log());

    match run(cli, &config, &interrupt) {
        Ok(()) => {}
        Err(e) if e.is_user_abort() => output::print_cancelled(),
        Err(e) => {
            tracing::error!(error = %e, "session failed");
            output::print_error(&e.to_string());
            log.record(&format!("Error: {e}"));
        }
    }

    output::print_done();
}
