//! Cross-column relationships.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::inference::pearson;
use crate::insight::{Insight, InsightCategory};
use crate::schema::{Column, Dataset};

use super::Analyzer;

/// Reports strongly correlated pairs of numeric columns.
pub struct PatternAnalyzer {
    correlation_threshold: f64,
    min_pairs: usize,
}

impl PatternAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            correlation_threshold: config.correlation_threshold,
            min_pairs: config.min_correlation_pairs,
        }
    }
}

impl Analyzer for PatternAnalyzer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn analyze(&self, dataset: &Dataset) -> Result<Vec<Insight>> {
        let numeric: Vec<&Column> = dataset.numeric_columns().collect();
        let mut insights = Vec::new();

        // Upper triangle only: each unordered pair once, no self-pairs
        for (i, a) in numeric.iter().enumerate() {
            for b in &numeric[i + 1..] {
                let Some(r) = pearson(a, b, self.min_pairs) else {
                    continue;
                };
                if r.abs() <= self.correlation_threshold {
                    continue;
                }

                let relation = if r > 0.0 { "Positive" } else { "Negative" };
                insights.push(
                    Insight::new(
                        InsightCategory::Pattern,
                        format!("Strong {} Correlation between {} and {}", relation, a.name, b.name),
                        format!(
                            "{} correlation ({:.2}) between '{}' and '{}'.",
                            relation, r, a.name, b.name
                        ),
                        r.abs(),
                    )
                    .with_columns([a.name.as_str(), b.name.as_str()]),
                );
            }
        }

        Ok(insights)
    }
}
