//! gumploop CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use gumploop_cli::cli::Cli;
use gumploop_cli::commands;

fn main() {
    // Load .env.local if it exists (agent binaries, terminal, window manager)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(cli.command) {
        Ok(report) => {
            println!("{}", report);
            if !report.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
