//! Job record and its state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};
use crate::insight::Insight;

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Edges of the job graph.
    ///
    /// `failed -> processing` exists for explicit reprocessing; whether it is
    /// taken is the orchestrator's policy.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Failed, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status write, carrying exactly the fields its target state needs.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Processing,
    Completed {
        insights: Vec<Insight>,
        processing_time_seconds: f64,
    },
    Failed {
        error: String,
        processing_time_seconds: Option<f64>,
    },
}

impl JobUpdate {
    pub fn processing() -> Self {
        JobUpdate::Processing
    }

    pub fn completed(insights: Vec<Insight>, processing_time_seconds: f64) -> Self {
        JobUpdate::Completed {
            insights,
            processing_time_seconds,
        }
    }

    pub fn failed(error: impl Into<String>, processing_time_seconds: Option<f64>) -> Self {
        JobUpdate::Failed {
            error: error.into(),
            processing_time_seconds,
        }
    }

    /// Status the job ends up in.
    pub fn status(&self) -> JobStatus {
        match self {
            JobUpdate::Processing => JobStatus::Processing,
            JobUpdate::Completed { .. } => JobStatus::Completed,
            JobUpdate::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Persistent record of one uploaded file and its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub file_id: String,
    /// Original upload file name.
    pub filename: String,
    pub status: JobStatus,
    pub upload_time: DateTime<Utc>,
    /// Ranked insights; only populated once completed.
    #[serde(default)]
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Job {
    /// A fresh `pending` job.
    pub fn new(
        file_id: impl Into<String>,
        filename: impl Into<String>,
        upload_time: DateTime<Utc>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            filename: filename.into(),
            status: JobStatus::Pending,
            upload_time,
            insights: Vec::new(),
            processing_time_seconds: None,
            error: None,
        }
    }

    /// Apply a status write, rejecting edges outside the job graph.
    pub fn apply(&mut self, update: JobUpdate) -> Result<()> {
        if !self.status.can_transition_to(update.status()) {
            return Err(InsightError::InvalidState {
                file_id: self.file_id.clone(),
                status: self.status,
            });
        }

        match update {
            JobUpdate::Processing => {
                self.status = JobStatus::Processing;
                self.insights.clear();
                self.processing_time_seconds = None;
                self.error = None;
            }
            JobUpdate::Completed {
                insights,
                processing_time_seconds,
            } => {
                self.status = JobStatus::Completed;
                self.insights = insights;
                self.processing_time_seconds = Some(processing_time_seconds);
                self.error = None;
            }
            JobUpdate::Failed {
                error,
                processing_time_seconds,
            } => {
                self.status = JobStatus::Failed;
                self.insights.clear();
                self.processing_time_seconds = processing_time_seconds;
                self.error = Some(error);
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            file_id: self.file_id.clone(),
            filename: self.filename.clone(),
            status: self.status,
            upload_time: self.upload_time,
            processing_time_seconds: self.processing_time_seconds,
            total_insights: self.insights.len(),
            error: self.error.clone(),
        }
    }
}

/// Status view of a job, without the insight bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub file_id: String,
    pub filename: String,
    pub status: JobStatus,
    pub upload_time: DateTime<Utc>,
    pub processing_time_seconds: Option<f64>,
    pub total_insights: usize,
    pub error: Option<String>,
}

/// Result payload for a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub file_id: String,
    pub insights: Vec<Insight>,
    pub processing_time: f64,
    pub total_insights: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::InsightCategory;

    fn job() -> Job {
        Job::new("f1", "data.csv", Utc::now())
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        job.apply(JobUpdate::processing()).unwrap();
        assert_eq!(job.status, JobStatus::Processing);

        let insight = Insight::new(InsightCategory::Overview, "Dataset Overview", "d", 1.0);
        job.apply(JobUpdate::completed(vec![insight], 0.25)).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.summary().total_insights, 1);
        assert_eq!(job.processing_time_seconds, Some(0.25));
    }

    #[test]
    fn test_pending_cannot_finish() {
        let mut job = job();
        assert!(matches!(
            job.apply(JobUpdate::completed(Vec::new(), 0.0)),
            Err(InsightError::InvalidState { status: JobStatus::Pending, .. })
        ));
        assert!(job.apply(JobUpdate::failed("x", None)).is_err());
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_completed_is_final() {
        let mut job = job();
        job.apply(JobUpdate::processing()).unwrap();
        job.apply(JobUpdate::completed(Vec::new(), 1.0)).unwrap();
        for update in [
            JobUpdate::processing(),
            JobUpdate::failed("late", None),
            JobUpdate::completed(Vec::new(), 2.0),
        ] {
            assert!(job.apply(update).is_err());
        }
        assert_eq!(job.processing_time_seconds, Some(1.0));
    }

    #[test]
    fn test_failed_reprocess_clears_error() {
        let mut job = job();
        job.apply(JobUpdate::processing()).unwrap();
        job.apply(JobUpdate::failed("boom", Some(0.1))).unwrap();
        assert_eq!(job.error.as_deref(), Some("boom"));

        job.apply(JobUpdate::processing()).unwrap();
        assert_eq!(job.error, None);
        assert_eq!(job.processing_time_seconds, None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Processing).unwrap(), "\"processing\"");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }
}
