//! Example: generate insights for a tabular data file.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path>
//!
//! Example:
//!   cargo run --example analyze -- sales.csv

use std::env;
use std::path::Path;

use insights::{generate_insights, InsightConfig, Parser};

fn main() -> insights::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example analyze -- sales.csv");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let config = InsightConfig::default();
    let (dataset, source) = Parser::new().parse_file(path)?;

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Insights: {}", source.file);
    println!("{}", separator);
    println!();

    println!("## Source");
    println!("  Format: {}", source.format);
    println!("  Rows: {}", source.row_count);
    println!("  Columns: {}", source.column_count);
    println!("  Hash: {}", source.hash);
    println!();

    println!("## Columns");
    for column in dataset.columns() {
        println!(
            "  {:24} {:12} nulls={:.0}%",
            column.name,
            column.column_type,
            column.null_ratio() * 100.0
        );
    }
    println!();

    let insights = generate_insights(&dataset, &config)?;
    println!("## Insights ({} total)", insights.len());
    println!();
    for (i, insight) in insights.iter().enumerate() {
        println!(
            "  {}. [{}] {} (confidence: {:.0}%)",
            i + 1,
            insight.category,
            insight.title,
            insight.confidence * 100.0
        );
        println!("     {}", insight.description);
        if !insight.affected_rows.is_empty() {
            println!("     Rows: {:?}", insight.affected_rows);
        }
        println!();
    }

    println!("{}", separator);
    Ok(())
}
