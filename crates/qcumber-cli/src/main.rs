//! Command-line front end for qcumber.
//!
//! Lists step patterns, checks feature files against them, formats feature
//! files canonically and exports single scenarios. Logs are written to
//! stderr; command output goes to stdout.

use std::process::ExitCode;

mod cli;
mod output;

fn main() -> eyre::Result<ExitCode> {
    cli::run()
}
