//! Column type inference.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DatasetConfig;
use crate::schema::{parse_number, ColumnType};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================
// Cheap shape checks compiled once; chrono does the strict parse afterwards.

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}",  // ISO date
        r"^\d{2}/\d{2}/\d{4}$", // US date
        r"^\d{2}-\d{2}-\d{4}$", // European date
        r"^\d{4}/\d{2}/\d{2}$", // Alt ISO
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "yes", "no", "t", "f", "y", "n"];

/// Normalizes raw cells and infers a [`ColumnType`] per column.
pub struct TypeInferrer {
    null_tokens: HashSet<String>,
    type_share_threshold: f64,
    categorical_ratio: f64,
    categorical_max_unique: usize,
}

impl TypeInferrer {
    pub fn new(config: &DatasetConfig) -> Self {
        Self {
            null_tokens: config
                .null_tokens
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            type_share_threshold: config.type_share_threshold,
            categorical_ratio: config.categorical_ratio,
            categorical_max_unique: config.categorical_max_unique,
        }
    }

    /// Trim a raw cell, mapping blanks and sentinel tokens to `None`.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.null_tokens.contains(&trimmed.to_lowercase()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Infer a column's type from its normalized cells.
    ///
    /// Checked in order: numeric, datetime, boolean, categorical, text.
    pub fn infer(&self, values: &[Option<String>]) -> ColumnType {
        let present: Vec<&str> = values.iter().filter_map(|v| v.as_deref()).collect();
        if present.is_empty() {
            return ColumnType::Text;
        }

        let total = present.len() as f64;
        let numeric = present.iter().filter(|v| parse_number(v).is_some()).count();
        if numeric as f64 / total >= self.type_share_threshold {
            return ColumnType::Numeric;
        }

        let dates = present.iter().filter(|v| looks_like_datetime(v)).count();
        if dates as f64 / total >= self.type_share_threshold {
            return ColumnType::DateTime;
        }

        if present.iter().all(|v| is_boolean_token(v)) {
            return ColumnType::Boolean;
        }

        let distinct: HashSet<&str> = present.iter().copied().collect();
        let ceiling = self.categorical_ratio * values.len() as f64;
        if distinct.len() as f64 <= ceiling && distinct.len() <= self.categorical_max_unique {
            ColumnType::Categorical
        } else {
            ColumnType::Text
        }
    }
}

/// Check whether a value parses under one of the supported date/time patterns.
pub fn looks_like_datetime(value: &str) -> bool {
    let value = value.trim();
    if !DATE_PATTERNS.iter().any(|p| p.is_match(value)) {
        return false;
    }

    DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
        || DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_boolean_token(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    BOOLEAN_TOKENS.contains(&lower.as_str())
}
