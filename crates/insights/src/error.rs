//! Error types for the insights library.

use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobStatus;

/// Main error type for insight generation.
#[derive(Debug, Error)]
pub enum InsightError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Uploaded bytes could not be turned into a dataset.
    #[error("Failed to parse file: {reason}")]
    Parse { reason: String },

    /// Upload rejected before parsing (extension, size).
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// Unknown file identifier.
    #[error("File not found: {file_id}")]
    NotFound { file_id: String },

    /// Requested transition is not legal from the job's current state.
    #[error("Job {file_id} cannot be processed while {status}")]
    InvalidState { file_id: String, status: JobStatus },

    /// Insights requested before the job completed.
    #[error("Insights for {file_id} are not ready (status: {status})")]
    NotReady { file_id: String, status: JobStatus },

    /// An analyzer failed or produced invalid output.
    #[error("Analysis failed in {analyzer}: {reason}")]
    AnalysisFailure { analyzer: String, reason: String },

    /// A run was cancelled before it finished.
    #[error("processing cancelled")]
    Cancelled,

    /// Job or upload storage error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    /// Shorthand for a parse failure.
    pub fn parse(reason: impl Into<String>) -> Self {
        InsightError::Parse {
            reason: reason.into(),
        }
    }

    /// Shorthand for an unknown file identifier.
    pub fn not_found(file_id: impl Into<String>) -> Self {
        InsightError::NotFound {
            file_id: file_id.into(),
        }
    }

    /// Shorthand for an analyzer failure.
    pub fn analysis(analyzer: impl Into<String>, reason: impl Into<String>) -> Self {
        InsightError::AnalysisFailure {
            analyzer: analyzer.into(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for InsightError {
    fn from(err: csv::Error) -> Self {
        InsightError::parse(err.to_string())
    }
}

impl From<calamine::Error> for InsightError {
    fn from(err: calamine::Error) -> Self {
        InsightError::parse(err.to_string())
    }
}

/// Result type alias for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;
