//! In-memory columnar dataset.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::config::DatasetConfig;
use crate::error::{InsightError, Result};
use crate::inference::TypeInferrer;

use super::column::{parse_number, Column};
use super::types::ColumnType;

/// An immutable table of typed columns with equal lengths.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Assemble a dataset from already-typed columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(InsightError::parse(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    /// Build a dataset from a header row and string records.
    ///
    /// Cells are trimmed, missing-value tokens become nulls and each column's
    /// type is inferred. Fails when there are no columns or no rows.
    pub fn from_records(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        config: &DatasetConfig,
    ) -> Result<Self> {
        if headers.is_empty() {
            return Err(InsightError::parse("no columns found"));
        }
        if rows.is_empty() {
            return Err(InsightError::parse("no data rows found"));
        }

        let headers = unique_headers(headers);
        let inferrer = TypeInferrer::new(config);

        let mut cells: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in &rows {
            for (col_idx, column) in cells.iter_mut().enumerate() {
                let raw = row.get(col_idx).map(String::as_str).unwrap_or("");
                column.push(inferrer.normalize(raw));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .enumerate()
            .map(|(position, (name, values))| {
                let column_type = inferrer.infer(&values);
                Column::new(name, position, column_type, values)
            })
            .collect();

        Self::new(columns)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Numeric columns in order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.column_type.is_numeric())
    }

    /// Count of columns per inferred type, for every type.
    pub fn type_counts(&self) -> BTreeMap<ColumnType, usize> {
        let mut counts: BTreeMap<ColumnType, usize> =
            ColumnType::ALL.iter().map(|t| (*t, 0)).collect();
        for column in &self.columns {
            *counts.entry(column.column_type).or_insert(0) += 1;
        }
        counts
    }

    /// Cells of one row across all columns.
    pub fn row(&self, row: usize) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Header row followed by up to `max_rows` rows as JSON values.
    ///
    /// Nulls stay null, numeric cells become numbers, everything else is a string.
    pub fn preview(&self, max_rows: usize) -> Vec<Vec<Value>> {
        let mut preview = Vec::with_capacity(max_rows.min(self.row_count) + 1);
        preview.push(
            self.columns
                .iter()
                .map(|c| Value::String(c.name.clone()))
                .collect(),
        );

        for row in 0..max_rows.min(self.row_count) {
            let values = self
                .columns
                .iter()
                .map(|column| match column.get(row) {
                    None => Value::Null,
                    Some(cell) => parse_number(cell)
                        .filter(|_| column.column_type.is_numeric())
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(cell.to_string())),
                })
                .collect();
            preview.push(values);
        }

        preview
    }
}

/// Replace empty header names and disambiguate repeats.
///
/// Suffixes skip any name already present in the header row, so `a,a,a_2`
/// becomes `a,a_3,a_2`.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let bases: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| match header.trim() {
            "" => format!("column_{}", i + 1),
            trimmed => trimmed.to_string(),
        })
        .collect();
    let reserved: BTreeSet<&str> = bases.iter().map(String::as_str).collect();
    let mut used: BTreeSet<String> = BTreeSet::new();

    bases
        .iter()
        .map(|base| {
            let mut name = base.clone();
            let mut suffix = 2;
            while used.contains(&name) || (name != *base && reserved.contains(name.as_str())) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}
