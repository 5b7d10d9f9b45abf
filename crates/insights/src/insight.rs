//! Insight value type.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Which analyzer family produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    /// Dataset shape and column types.
    Overview,
    /// Distribution properties of single columns.
    Statistical,
    /// Relationships between columns.
    Pattern,
    /// Missing values and duplicates.
    Quality,
}

impl InsightCategory {
    /// Tie-break rank used when confidences are equal (higher wins).
    pub fn priority(&self) -> u8 {
        match self {
            InsightCategory::Quality => 3,
            InsightCategory::Statistical => 2,
            InsightCategory::Pattern => 1,
            InsightCategory::Overview => 0,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            InsightCategory::Overview => "Overview",
            InsightCategory::Statistical => "Statistical",
            InsightCategory::Pattern => "Pattern",
            InsightCategory::Quality => "Quality",
        }
    }
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single finding about a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Short title, unique per category for a given finding.
    pub title: String,
    /// Human-readable description.
    pub description: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub category: InsightCategory,
    /// Columns the finding refers to, in first-mention order.
    #[serde(default)]
    pub affected_columns: IndexSet<String>,
    /// Row indices the finding refers to, ascending.
    #[serde(default)]
    pub affected_rows: Vec<usize>,
}

impl Insight {
    /// Create a new insight with no affected columns or rows.
    pub fn new(
        category: InsightCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confidence,
            category,
            affected_columns: IndexSet::new(),
            affected_rows: Vec::new(),
        }
    }

    /// Add one affected column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.affected_columns.insert(column.into());
        self
    }

    /// Add several affected columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Set affected rows; they are sorted and deduplicated.
    pub fn with_rows(mut self, mut rows: Vec<usize>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        self.affected_rows = rows;
        self
    }

    /// Deduplication key used by the ranker.
    pub fn key(&self) -> (InsightCategory, &str) {
        (self.category, self.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let insight = Insight::new(InsightCategory::Pattern, "t", "d", 0.9)
            .with_columns(["x", "y"])
            .with_column("x")
            .with_rows(vec![4, 1, 4]);

        assert_eq!(insight.affected_columns.len(), 2);
        assert_eq!(insight.affected_rows, vec![1, 4]);
    }

    #[test]
    fn test_category_priority_order() {
        assert!(InsightCategory::Quality.priority() > InsightCategory::Statistical.priority());
        assert!(InsightCategory::Statistical.priority() > InsightCategory::Pattern.priority());
        assert!(InsightCategory::Pattern.priority() > InsightCategory::Overview.priority());
    }

    #[test]
    fn test_serialized_shape() {
        let insight = Insight::new(InsightCategory::Quality, "Missing Data in a", "d", 0.75)
            .with_column("a");
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["category"], "quality");
        assert_eq!(json["affected_columns"], serde_json::json!(["a"]));
        assert_eq!(json["affected_rows"], serde_json::json!([]));
    }
}
