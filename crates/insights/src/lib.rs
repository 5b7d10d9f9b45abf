//! Insights: automatic insight generation for uploaded tabular datasets.
//!
//! An upload is parsed into a typed [`Dataset`], a fixed set of analyzers turns
//! it into candidate [`Insight`]s, and the ranker keeps the most useful ones.
//! The [`Orchestrator`] drives each uploaded file through
//! `pending -> processing -> completed | failed` in the background.
//!
//! # Example
//!
//! ```
//! use insights::{generate_insights, InsightConfig, Parser};
//!
//! let dataset = Parser::new()
//!     .parse(b"sales\n10\n10\n10\n1000\n10\n", "csv")
//!     .unwrap();
//! let insights = generate_insights(&dataset, &InsightConfig::default()).unwrap();
//!
//! assert!(insights.iter().any(|i| i.title == "Outliers Detected in sales"));
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod inference;
pub mod input;
pub mod insight;
pub mod job;
pub mod ranking;
pub mod schema;
pub mod upload;

pub use analysis::{Analyzer, AnalyzerSet, CancelFlag};
pub use config::{AnalysisConfig, DatasetConfig, InsightConfig, OutlierRule, ReprocessPolicy};
pub use error::{InsightError, Result};
pub use input::{Parser, ParserConfig, SourceMetadata};
pub use insight::{Insight, InsightCategory};
pub use job::{
    FsUploadStore, InsightReport, Job, JobStatus, JobStore, JobSummary, JobUpdate, JsonJobStore,
    MemoryJobStore, MemoryUploadStore, Orchestrator, ProgressEvent, UploadStore,
};
pub use ranking::{rank, InsightRanker};
pub use schema::{Column, ColumnType, Dataset};
pub use upload::{UploadGateway, UploadReceipt};

/// Run every analyzer on the current thread and rank the result.
pub fn generate_insights(dataset: &Dataset, config: &InsightConfig) -> Result<Vec<Insight>> {
    let candidates = AnalyzerSet::new(&config.analysis).analyze_all(dataset)?;
    Ok(InsightRanker::from_config(config).rank(candidates))
}
