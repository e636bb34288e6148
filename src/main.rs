//! cvpress command-line entrypoint.
//!
//! Parses arguments, installs logging, runs one generation and exits with a
//! failure status if any stage fails.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    if let Err(e) = cli::run(args) {
        eprintln!("✗ Error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`; without either only warnings are shown.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},cvpress={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
