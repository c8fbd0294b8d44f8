use std::process::ExitCode;

use clap::Parser;
use colorshift::{cli, log_info, logger};

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();
    log_info!("colorshift {}", env!("CARGO_PKG_VERSION"));

    let args = cli::CliArgs::parse();
    if args.verbose
        && let Some(path) = logger::log_path()
    {
        eprintln!("Log file: {}", path.display());
    }
    cli::run(args)
}
