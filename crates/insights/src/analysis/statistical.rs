//! Per-column distribution analysis: variability and outliers.

use crate::config::{AnalysisConfig, OutlierRule};
use crate::error::Result;
use crate::inference::summarize;
use crate::insight::{Insight, InsightCategory};
use crate::schema::{Column, Dataset, NumericSummary};

use super::{scaled_above, Analyzer};

/// Flags highly variable numeric columns and numeric outliers.
pub struct StatisticalAnalyzer {
    variability_threshold: f64,
    outlier_rule: OutlierRule,
    max_affected_rows: usize,
}

impl StatisticalAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            variability_threshold: config.variability_threshold,
            outlier_rule: config.outlier_rule,
            max_affected_rows: config.max_affected_rows,
        }
    }

    fn variability(&self, column: &Column, summary: &NumericSummary) -> Option<Insight> {
        let cv = summary.coefficient_of_variation()?;
        if cv <= self.variability_threshold {
            return None;
        }

        Some(
            Insight::new(
                InsightCategory::Statistical,
                format!("High Variability in {}", column.name),
                format!(
                    "Column '{}' has a coefficient of variation of {:.1}% (mean {:.2}, std {:.2}).",
                    column.name,
                    cv * 100.0,
                    summary.mean,
                    summary.std
                ),
                variability_confidence(cv, self.variability_threshold),
            )
            .with_column(column.name.as_str()),
        )
    }

    fn outliers(&self, column: &Column, summary: &NumericSummary) -> Option<Insight> {
        let rows = self.outlier_rule.detect(column, summary);
        if rows.is_empty() {
            return None;
        }

        let (low, high) = rows
            .iter()
            .filter_map(|&r| column.number(r))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let proportion = rows.len() as f64 / summary.count as f64;

        Some(
            Insight::new(
                InsightCategory::Statistical,
                format!("Outliers Detected in {}", column.name),
                format!(
                    "Found {} potential outliers in '{}' ({:.1}% of values, {}). Outlying values range from {:.2} to {:.2}.",
                    rows.len(),
                    column.name,
                    proportion * 100.0,
                    self.outlier_rule.describe(),
                    low,
                    high
                ),
                outlier_confidence(proportion),
            )
            .with_column(column.name.as_str())
            .with_rows(rows.into_iter().take(self.max_affected_rows).collect()),
        )
    }
}

impl Analyzer for StatisticalAnalyzer {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn analyze(&self, dataset: &Dataset) -> Result<Vec<Insight>> {
        let mut insights = Vec::new();

        for column in dataset.numeric_columns() {
            let Some(summary) = summarize(column) else {
                continue;
            };
            insights.extend(self.variability(column, &summary));
            insights.extend(self.outliers(column, &summary));
        }

        Ok(insights)
    }
}

/// 0.5 at the threshold, approaching 1.0 as the CV grows.
fn variability_confidence(cv: f64, threshold: f64) -> f64 {
    scaled_above(cv / threshold, 0.5, 1.0)
}

/// Grows with the share of outlying values, capped at 0.95.
fn outlier_confidence(proportion: f64) -> f64 {
    (0.6 + proportion).min(0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::make_dataset;

    fn analyzer() -> StatisticalAnalyzer {
        StatisticalAnalyzer::new(&AnalysisConfig::default())
    }

    #[test]
    fn test_sales_spike_reports_variability_and_outlier() {
        let dataset = make_dataset(
            &["sales"],
            &[&["10"], &["10"], &["10"], &["1000"], &["10"]],
        );
        let insights = analyzer().analyze(&dataset).unwrap();

        assert_eq!(insights.len(), 2);
        let variability = insights
            .iter()
            .find(|i| i.title == "High Variability in sales")
            .unwrap();
        assert!(variability.affected_columns.contains("sales"));
        assert!(variability.confidence > 0.5 && variability.confidence <= 1.0);

        let outliers = insights
            .iter()
            .find(|i| i.title == "Outliers Detected in sales")
            .unwrap();
        assert!(outliers.affected_columns.contains("sales"));
        assert_eq!(outliers.affected_rows, vec![3]);
    }

    #[test]
    fn test_variability_confidence_is_monotonic() {
        let a = variability_confidence(0.6, 0.5);
        let b = variability_confidence(1.2, 0.5);
        let c = variability_confidence(5.0, 0.5);
        assert!(a < b && b < c);
        assert!(c <= 1.0);
    }

    #[test]
    fn test_zero_variance_column_is_silent() {
        let dataset = make_dataset(&["flat"], &[&["7"], &["7"], &["7"], &["7"]]);
        assert!(analyzer().analyze(&dataset).unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_dataset_is_silent() {
        let dataset = make_dataset(
            &["name", "color"],
            &[&["ann", "red"], &["bob", "red"], &["cy", "blue"]],
        );
        assert!(analyzer().analyze(&dataset).unwrap().is_empty());
    }

    #[test]
    fn test_affected_rows_are_capped() {
        let config = AnalysisConfig {
            max_affected_rows: 2,
            ..AnalysisConfig::default()
        };
        let mut rows: Vec<Vec<String>> = (0..20).map(|_| vec!["1".to_string()]).collect();
        for spike in [3, 8, 12, 17] {
            rows[spike] = vec!["900".to_string()];
        }
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        let dataset = make_dataset(&["v"], &rows);

        let insights = StatisticalAnalyzer::new(&config).analyze(&dataset).unwrap();
        let outliers = insights
            .iter()
            .find(|i| i.title.starts_with("Outliers"))
            .unwrap();
        assert_eq!(outliers.affected_rows, vec![3, 8]);
        assert!(outliers.description.contains("Found 4 potential outliers"));
    }
}
