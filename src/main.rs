//! pagewatch - Single-Page Change Detector
//!
//! Entry point for the pagewatch CLI.

use clap::Parser;
use pagewatch::{
    cli::Cli,
    error::{report, ExitCode},
    logging::init_logging,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match pagewatch::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            eprintln!("{}", report(&err, exit_code));
            std::process::exit(exit_code.as_i32());
        }
    }
}
