//! Outlier rules for numeric columns.

use crate::config::OutlierRule;
use crate::schema::{Column, NumericSummary};

impl OutlierRule {
    /// Row indices whose value falls outside the rule's bounds.
    pub fn detect(&self, column: &Column, summary: &NumericSummary) -> Vec<usize> {
        if summary.count < 2 {
            return Vec::new();
        }

        column
            .numeric_values()
            .filter(|&(_, value)| self.is_outlier(value, summary))
            .map(|(row, _)| row)
            .collect()
    }

    fn is_outlier(&self, value: f64, summary: &NumericSummary) -> bool {
        match *self {
            OutlierRule::Iqr { multiplier } => summary.is_outlier_iqr(value, multiplier),
            OutlierRule::ZScore { threshold } => {
                summary.std > 0.0 && summary.z_score(value).abs() > threshold
            }
        }
    }

    /// Short description for insight text.
    pub fn describe(&self) -> String {
        match self {
            OutlierRule::Iqr { multiplier } => format!("IQR rule, {multiplier}x"),
            OutlierRule::ZScore { threshold } => format!("z-score above {threshold}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::summarize;
    use crate::schema::ColumnType;

    fn column(values: &[f64]) -> Column {
        Column::new(
            "v",
            0,
            ColumnType::Numeric,
            values.iter().map(|v| Some(v.to_string())).collect(),
        )
    }

    #[test]
    fn test_iqr_flags_spike() {
        let col = column(&[10.0, 10.0, 10.0, 1000.0, 10.0]);
        let summary = summarize(&col).unwrap();
        assert_eq!(OutlierRule::Iqr { multiplier: 1.5 }.detect(&col, &summary), vec![3]);
    }

    #[test]
    fn test_zscore_flags_far_values_only() {
        let mut values = vec![50.0; 30];
        values[7] = 500.0;
        let col = column(&values);
        let summary = summarize(&col).unwrap();
        assert_eq!(OutlierRule::ZScore { threshold: 3.0 }.detect(&col, &summary), vec![7]);
    }

    #[test]
    fn test_flat_column_has_no_outliers() {
        let col = column(&[4.0, 4.0, 4.0]);
        let summary = summarize(&col).unwrap();
        assert!(OutlierRule::default().detect(&col, &summary).is_empty());
        assert!(OutlierRule::ZScore { threshold: 3.0 }.detect(&col, &summary).is_empty());
    }
}
