//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Insights: automatic insight generation for tabular datasets
#[derive(Parser)]
#[command(name = "insights")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: ./insights.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate insights for a single file and print them
    Analyze {
        /// Path to the data file (CSV/TSV/TXT/XLS/XLSX)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output the job record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from(["insights", "analyze", "data.csv", "--json", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze { file, json } => {
                assert_eq!(file, PathBuf::from("data.csv"));
                assert!(json);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["insights", "serve", "--port", "9000", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), host: None }));
    }
}
