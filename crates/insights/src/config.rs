//! Configuration for the insight pipeline.
//!
//! Every section deserializes with defaults, so a partial TOML file or a
//! handful of environment overrides is enough to tune a single threshold.

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Maximum number of insights kept by the ranker.
    pub max_insights: usize,
    /// Insights below this confidence are dropped by the ranker.
    pub min_confidence_score: f64,
    /// Dataset parsing and type inference.
    pub dataset: DatasetConfig,
    /// Analyzer thresholds.
    pub analysis: AnalysisConfig,
    /// Upload gateway limits.
    pub upload: UploadConfig,
    /// Job lifecycle policy.
    pub jobs: JobConfig,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            max_insights: 5,
            min_confidence_score: 0.1,
            dataset: DatasetConfig::default(),
            analysis: AnalysisConfig::default(),
            upload: UploadConfig::default(),
            jobs: JobConfig::default(),
        }
    }
}

impl InsightConfig {
    /// Reject settings that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence_score) {
            return Err(InsightError::Config(format!(
                "min_confidence_score must be within [0, 1], got {}",
                self.min_confidence_score
            )));
        }
        if !(0.0..=1.0).contains(&self.analysis.correlation_threshold) {
            return Err(InsightError::Config(format!(
                "correlation_threshold must be within [0, 1], got {}",
                self.analysis.correlation_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.analysis.null_ratio_threshold) {
            return Err(InsightError::Config(format!(
                "null_ratio_threshold must be within [0, 1], got {}",
                self.analysis.null_ratio_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.analysis.duplicate_confidence) {
            return Err(InsightError::Config(format!(
                "duplicate_confidence must be within [0, 1], got {}",
                self.analysis.duplicate_confidence
            )));
        }
        if self.analysis.variability_threshold <= 0.0 {
            return Err(InsightError::Config(
                "variability_threshold must be positive".to_string(),
            ));
        }
        if self.dataset.type_share_threshold <= 0.0 || self.dataset.type_share_threshold > 1.0 {
            return Err(InsightError::Config(
                "type_share_threshold must be within (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parsing and column type inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Tokens (case-insensitive) treated as missing values in addition to blank cells.
    pub null_tokens: Vec<String>,
    /// Share of non-null values that must parse for a numeric or datetime column.
    pub type_share_threshold: f64,
    /// Distinct values / rows at or below which a column is categorical.
    pub categorical_ratio: f64,
    /// Absolute ceiling on distinct values for a categorical column.
    pub categorical_max_unique: usize,
    /// Datasets with more rows fail processing.
    pub max_rows: Option<usize>,
    /// Datasets with more columns fail processing.
    pub max_columns: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            null_tokens: ["na", "n/a", "nan", "null", "none", "nil", ".", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            type_share_threshold: 0.9,
            categorical_ratio: 0.5,
            categorical_max_unique: 50,
            max_rows: Some(1_000_000),
            max_columns: Some(1_000),
        }
    }
}

/// Rule used to flag numeric outliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierRule {
    /// Outside `[q1 - k*iqr, q3 + k*iqr]`.
    Iqr { multiplier: f64 },
    /// Absolute z-score above the threshold.
    ZScore { threshold: f64 },
}

impl Default for OutlierRule {
    fn default() -> Self {
        OutlierRule::Iqr { multiplier: 1.5 }
    }
}

/// Thresholds used by the analyzer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Coefficient of variation above which a column is "highly variable".
    pub variability_threshold: f64,
    /// Outlier detection rule.
    pub outlier_rule: OutlierRule,
    /// Absolute Pearson correlation above which a pair is reported.
    pub correlation_threshold: f64,
    /// Minimum rows with both values present before correlating a pair.
    pub min_correlation_pairs: usize,
    /// Null ratio above which a column gets a missing-data insight.
    pub null_ratio_threshold: f64,
    /// Confidence attached to the duplicate-rows insight.
    pub duplicate_confidence: f64,
    /// Maximum row indices listed on a single insight.
    pub max_affected_rows: usize,
    /// Run analyzers concurrently on the blocking pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            variability_threshold: 0.5,
            outlier_rule: OutlierRule::default(),
            correlation_threshold: 0.7,
            min_correlation_pairs: 3,
            null_ratio_threshold: 0.1,
            duplicate_confidence: 0.95,
            max_affected_rows: 10,
            parallel: true,
        }
    }
}

/// Upload gateway limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Largest accepted upload in bytes.
    pub max_file_size: usize,
    /// Rows returned in the upload preview.
    pub max_preview_rows: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["csv", "tsv", "txt", "xls", "xlsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            max_preview_rows: 5,
        }
    }
}

/// Whether a terminal job may be submitted again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReprocessPolicy {
    /// Terminal jobs are never restarted.
    Never,
    /// Failed jobs may be resubmitted; completed jobs may not.
    #[default]
    FailedOnly,
}

/// Job lifecycle settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub reprocess: ReprocessPolicy,
}
