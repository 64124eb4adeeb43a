//! Dirlock: fair mutual exclusion through a shared directory.
//!
//! This is the main entry point for the `dirlock` CLI. It parses arguments,
//! sets up logging on stderr, dispatches to the appropriate command handler,
//! and handles errors with proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use dirlock::exit_codes;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Log to stderr so stdout only ever carries the lock id.
///
/// `RUST_LOG`, when set, replaces the level chosen with `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
