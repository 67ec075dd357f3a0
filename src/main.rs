mod api;
mod cli;
mod config;
mod console;
mod list;
mod model;
mod reap;
mod retention;

use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

/// Env var holding the log filter.
const LOG_ENV: &str = "PAGES_REAPER_LOG";

fn main() {
    // Logs go to stderr so stdout stays the human report.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
