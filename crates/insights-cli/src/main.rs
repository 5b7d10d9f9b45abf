//! Insights CLI - HTTP service and one-shot analysis for tabular datasets.

mod cli;
mod commands;
mod server;
mod settings;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use settings::Settings;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Settings::load(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Serve { host, port } => commands::serve::run(settings, host, port),
        Commands::Analyze { file, json } => commands::analyze::run(settings, file, json, cli.verbose),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log filter from `INSIGHTS_LOG`, else `info` (`debug` with `--verbose`).
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("INSIGHTS_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
