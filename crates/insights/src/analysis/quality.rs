//! Data quality: missing values and duplicate rows.

use indexmap::IndexMap;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::insight::{Insight, InsightCategory};
use crate::schema::{Column, Dataset};

use super::Analyzer;

/// Flags columns with many missing values and exact duplicate rows.
pub struct QualityAnalyzer {
    null_ratio_threshold: f64,
    duplicate_confidence: f64,
    max_affected_rows: usize,
}

impl QualityAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            null_ratio_threshold: config.null_ratio_threshold,
            duplicate_confidence: config.duplicate_confidence,
            max_affected_rows: config.max_affected_rows,
        }
    }

    fn missing(&self, column: &Column) -> Option<Insight> {
        let ratio = column.null_ratio();
        if ratio <= self.null_ratio_threshold {
            return None;
        }

        let rows: Vec<usize> = (0..column.len())
            .filter(|&r| column.get(r).is_none())
            .take(self.max_affected_rows)
            .collect();

        Some(
            Insight::new(
                InsightCategory::Quality,
                format!("Missing Data in {}", column.name),
                format!(
                    "Column '{}' is missing {} of {} values ({:.1}%).",
                    column.name,
                    column.null_count(),
                    column.len(),
                    ratio * 100.0
                ),
                (0.5 + 0.5 * ratio).min(1.0),
            )
            .with_column(column.name.as_str())
            .with_rows(rows),
        )
    }

    fn duplicates(&self, dataset: &Dataset) -> Option<Insight> {
        if dataset.row_count() < 2 {
            return None;
        }

        let groups = duplicate_groups(dataset);
        let mut repeats: Vec<usize> = groups.iter().flat_map(|g| g[1..].iter().copied()).collect();
        repeats.sort_unstable();
        if repeats.is_empty() {
            return None;
        }

        Some(
            Insight::new(
                InsightCategory::Quality,
                "Duplicate Rows Detected",
                format!(
                    "Found {} duplicate rows in {} groups of identical records.",
                    repeats.len(),
                    groups.len()
                ),
                self.duplicate_confidence,
            )
            .with_columns(dataset.column_names())
            .with_rows(repeats.into_iter().take(self.max_affected_rows).collect()),
        )
    }
}

impl Analyzer for QualityAnalyzer {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn analyze(&self, dataset: &Dataset) -> Result<Vec<Insight>> {
        let mut insights: Vec<Insight> = dataset
            .columns()
            .iter()
            .filter_map(|column| self.missing(column))
            .collect();
        insights.extend(self.duplicates(dataset));
        Ok(insights)
    }
}

/// Groups of row indices whose cells are all equal, in first-occurrence order.
///
/// Only groups with at least two rows are returned. Missing cells compare equal
/// to each other.
pub fn duplicate_groups(dataset: &Dataset) -> Vec<Vec<usize>> {
    let mut seen: IndexMap<Vec<Option<&str>>, Vec<usize>> = IndexMap::new();
    for row in 0..dataset.row_count() {
        seen.entry(dataset.row(row)).or_default().push(row);
    }
    seen.into_values().filter(|rows| rows.len() > 1).collect()
}
