//! `hostpulse` CLI - live telemetry for remote Linux hosts
//!
//! Watches a saved or ad-hoc SSH connection, parses captured command output
//! offline, and lists the remote commands and configured profiles.

mod cli;
mod commands;
mod error;
mod format;
mod util;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if !cli.quiet {
        let tracing_config = util::tracing_config(config_path, cli.verbose);
        if let Err(e) = hostpulse_core::tracing::init_tracing(&tracing_config) {
            eprintln!("Warning: {e}");
        }
    }

    let result = commands::dispatch(config_path, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
