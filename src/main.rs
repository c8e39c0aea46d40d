//! fixloop CLI entry point.

use clap::Parser;
use std::process::ExitCode;

use fixloop::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    run(Cli::parse()).await
}
