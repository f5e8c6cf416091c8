//! Binary crate for the `airq` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - The progress indicator shown during network I/O
//! - Human-friendly, colorized report output

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

mod app;
mod cli;
mod logging;
mod render;
mod spinner;
mod term;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing(Level::WARN);
    app::run(cli::Cli::try_parse()).await
}
