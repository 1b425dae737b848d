use std::process::ExitCode;

use clap::Parser;

use liquidglass::cli::{self, CliArgs};
use liquidglass::logger;

fn main() -> ExitCode {
    logger::init();
    let args = CliArgs::parse();
    cli::run(args)
}
