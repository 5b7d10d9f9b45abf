//! Column storage and numeric summaries.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// Summary statistics for a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of non-null numeric values.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
}

impl NumericSummary {
    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let iqr = self.iqr();
        let lower = self.q1 - multiplier * iqr;
        let upper = self.q3 + multiplier * iqr;
        value < lower || value > upper
    }

    /// Calculate the z-score for a value.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }

    /// Coefficient of variation (`std / |mean|`).
    ///
    /// `None` when the column has no spread or a zero mean.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        if self.std == 0.0 || self.mean == 0.0 {
            return None;
        }
        let cv = self.std / self.mean.abs();
        cv.is_finite().then_some(cv)
    }
}

/// A single named column with normalized cells.
///
/// Missing values are `None`; every other cell keeps its trimmed text.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Zero-based position in the dataset.
    pub position: usize,
    /// Inferred type.
    pub column_type: ColumnType,
    values: Vec<Option<String>>,
    numbers: Vec<Option<f64>>,
}

impl Column {
    /// Build a column from normalized cells.
    ///
    /// Numeric columns cache their parsed values; cells that do not parse
    /// are excluded from numeric analysis but are not treated as missing.
    pub fn new(
        name: impl Into<String>,
        position: usize,
        column_type: ColumnType,
        values: Vec<Option<String>>,
    ) -> Self {
        let numbers = if column_type.is_numeric() {
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_number))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            name: name.into(),
            position,
            column_type,
            values,
            numbers,
        }
    }

    /// Number of cells (equals the dataset row count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All cells in row order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// A single cell.
    pub fn get(&self, row: usize) -> Option<&str> {
        self.values.get(row).and_then(|v| v.as_deref())
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Share of missing cells in `[0, 1]`.
    pub fn null_ratio(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.values.len() as f64
        }
    }

    /// Parsed numeric value at a row (numeric columns only).
    pub fn number(&self, row: usize) -> Option<f64> {
        self.numbers.get(row).copied().flatten()
    }

    /// `(row, value)` pairs for every parsed number.
    pub fn numeric_values(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.numbers
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|n| (row, n)))
    }
}

/// Parse a finite number; `inf` and `NaN` spellings are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
