//! Analyze command - run the full pipeline once with in-memory stores.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use insights::{
    InsightCategory, Job, JobStatus, MemoryJobStore, MemoryUploadStore, Orchestrator, UploadGateway,
};

use crate::settings::Settings;

pub fn run(settings: Settings, file: PathBuf, json: bool, verbose: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !json {
        println!("{} {}", "Analyzing".cyan().bold(), file.display().to_string().white());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let (receipt, job) = runtime.block_on(async {
        let store = Arc::new(MemoryJobStore::new());
        let uploads = Arc::new(MemoryUploadStore::new());
        let config = settings.insights.clone();
        let gateway = UploadGateway::new(config.clone(), store.clone(), uploads.clone());
        let orchestrator = Orchestrator::new(config, store, uploads);

        let receipt = gateway.upload(&filename, bytes).await?;
        orchestrator.submit_processing(&receipt.file_id).await?;
        let job = orchestrator.wait(&receipt.file_id).await?;
        anyhow::Ok((receipt, job))
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
        return ensure_completed(&job);
    }

    if verbose {
        println!();
        println!("{}", "Source:".yellow().bold());
        println!("  Format: {}", receipt.source.format);
        println!(
            "  Rows: {}  Columns: {}",
            receipt.source.row_count, receipt.source.column_count
        );
        println!("  Hash: {}", receipt.source.hash);
    }

    ensure_completed(&job)?;

    println!();
    println!(
        "{} ({} found in {:.2}s)",
        "Insights".green().bold(),
        job.insights.len(),
        job.processing_time_seconds.unwrap_or(0.0)
    );
    println!();

    for (i, insight) in job.insights.iter().enumerate() {
        let tag = format!("[{}]", insight.category);
        let tag = match insight.category {
            InsightCategory::Quality => tag.red(),
            InsightCategory::Statistical => tag.yellow(),
            InsightCategory::Pattern => tag.blue(),
            InsightCategory::Overview => tag.cyan(),
        };
        println!(
            "  {}. {} {} {}",
            i + 1,
            tag,
            insight.title.bold(),
            format!("({:.0}%)", insight.confidence * 100.0).dimmed()
        );
        println!("     {}", insight.description);
        if verbose && !insight.affected_rows.is_empty() {
            println!("     Rows: {:?}", insight.affected_rows);
        }
    }
    println!();

    Ok(())
}

/// A failed run is a command failure, whatever the output format.
fn ensure_completed(job: &Job) -> anyhow::Result<()> {
    if job.status == JobStatus::Failed {
        anyhow::bail!(
            "analysis failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
