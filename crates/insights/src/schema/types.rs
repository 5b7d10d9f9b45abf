//! Core type definitions for dataset columns.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inferred semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Numbers (integers or floats).
    Numeric,
    /// Low-cardinality discrete values.
    Categorical,
    /// Dates and date-times.
    #[serde(rename = "datetime")]
    DateTime,
    /// High-cardinality free text.
    Text,
    /// True/false tokens.
    Boolean,
}

impl ColumnType {
    /// All variants in reporting order.
    pub const ALL: [ColumnType; 5] = [
        ColumnType::Numeric,
        ColumnType::Categorical,
        ColumnType::DateTime,
        ColumnType::Text,
        ColumnType::Boolean,
    ];

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }

    /// Lowercase label used in descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::DateTime => "datetime",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
