//! # docqa CLI
//!
//! Command-line interface for grounded question answering over your
//! documents. Run `docqa --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
