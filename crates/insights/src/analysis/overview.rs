//! Dataset overview.

use crate::error::Result;
use crate::insight::{Insight, InsightCategory};
use crate::schema::Dataset;

use super::Analyzer;

/// Summarizes shape and column types. Always emits exactly one insight.
pub struct OverviewAnalyzer;

impl Analyzer for OverviewAnalyzer {
    fn name(&self) -> &'static str {
        "overview"
    }

    fn analyze(&self, dataset: &Dataset) -> Result<Vec<Insight>> {
        let types = dataset
            .type_counts()
            .iter()
            .map(|(column_type, count)| format!("{} {}", count, column_type))
            .collect::<Vec<_>>()
            .join(", ");

        let insight = Insight::new(
            InsightCategory::Overview,
            "Dataset Overview",
            format!(
                "Dataset contains {} rows and {} columns. Column types: {}.",
                dataset.row_count(),
                dataset.column_count(),
                types
            ),
            1.0,
        )
        .with_columns(dataset.column_names());

        Ok(vec![insight])
    }
}
