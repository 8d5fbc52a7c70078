mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use importer_engine::ImportError;

use platform::console;

/// Exit status when the requested file is not in the remote listing.
const EXIT_NOT_FOUND: u8 = 4;
/// Exit status for every other failure.
const EXIT_FAILURE: u8 = 129;

/// Import a release archive from the project's SourceForge file listing into
/// the working tree, then commit and tag it.
#[derive(Debug, Parser)]
#[command(name = "release-import", version)]
pub struct Cli {
    /// Archive to import: a file name such as 'htmLawed_1.1.19_19Jan2015.zip',
    /// a path relative to the listing root, or a file number from the listing.
    pub filename: String,

    /// Working tree that receives the extracted files [default: .]
    #[arg(long, value_name = "DIR")]
    pub tree: Option<PathBuf>,

    /// Directory for the page cache and downloaded archives [default: ./var]
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Settings file in RON format
    #[arg(long, value_name = "FILE", default_value = platform::settings::DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Extract and report, but run no git commands
    #[arg(long)]
    pub dry_run: bool,

    /// Log debug output to the terminal as well as the log file
    #[arg(short, long)]
    pub verbose: bool,

    /// Log file [default: ./importer.log]
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    platform::logging::initialize(&cli);

    let status = match platform::app::run_app(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    };
    println!();
    status
}

fn report(err: &anyhow::Error) -> ExitCode {
    eprintln!("error: {err:#}");
    let code = exit_status(err);
    match err.downcast_ref::<ImportError>() {
        Some(ImportError::NotFound { available, .. }) => {
            println!("the following files are available:");
            print!("{}", console::available_files(available));
        }
        _ => {
            let _ = Cli::command().print_help();
        }
    }
    ExitCode::from(code)
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ImportError>() {
        Some(import) if import.is_not_found() => EXIT_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}
