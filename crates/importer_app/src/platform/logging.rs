//! Logger setup for the binary.
//!
//! Logs go to `./importer.log` (or `--log-file`); `--verbose` also echoes them
//! to the terminal at debug level.

use std::path::PathBuf;

use importer_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

use crate::Cli;

pub fn initialize(cli: &Cli) {
    let (destination, level) = destination_for(cli);
    if !importer_logging::initialize(destination, level) {
        eprintln!("warning: logging is disabled");
    }
}

fn destination_for(cli: &Cli) -> (LogDestination, LevelFilter) {
    let path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    if cli.verbose {
        (LogDestination::Both(path), LevelFilter::Debug)
    } else {
        (LogDestination::File(path), LevelFilter::Info)
    }
}
