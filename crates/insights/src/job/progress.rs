//! Progress events published while a job runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::JobStatus;

/// Pipeline stages reported through [`ProgressEvent::InsightProgress`].
pub const STAGES: [&str; 4] = [
    "Parsing dataset",
    "Validating data structure",
    "Running analyzers",
    "Ranking insights",
];

/// A real-time notification about one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    StatusUpdate {
        file_id: String,
        status: JobStatus,
        message: String,
        timestamp: DateTime<Utc>,
    },
    InsightProgress {
        file_id: String,
        current_step: String,
        current_step_num: usize,
        total_steps: usize,
        progress: f64,
        insights_found: usize,
        timestamp: DateTime<Utc>,
    },
    InsightsComplete {
        file_id: String,
        insights_count: usize,
        processing_time: f64,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn status(file_id: &str, status: JobStatus, message: impl Into<String>) -> Self {
        ProgressEvent::StatusUpdate {
            file_id: file_id.to_string(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Progress at `stage` (zero-based index into [`STAGES`]).
    pub fn step(file_id: &str, stage: usize, insights_found: usize) -> Self {
        let total_steps = STAGES.len();
        let current_step_num = (stage + 1).min(total_steps);
        ProgressEvent::InsightProgress {
            file_id: file_id.to_string(),
            current_step: STAGES[current_step_num - 1].to_string(),
            current_step_num,
            total_steps,
            progress: current_step_num as f64 / total_steps as f64 * 100.0,
            insights_found,
            timestamp: Utc::now(),
        }
    }

    pub fn complete(file_id: &str, insights_count: usize, processing_time: f64) -> Self {
        ProgressEvent::InsightsComplete {
            file_id: file_id.to_string(),
            insights_count,
            processing_time,
            timestamp: Utc::now(),
        }
    }

    pub fn file_id(&self) -> &str {
        match self {
            ProgressEvent::StatusUpdate { file_id, .. }
            | ProgressEvent::InsightProgress { file_id, .. }
            | ProgressEvent::InsightsComplete { file_id, .. } => file_id,
        }
    }

    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::StatusUpdate { .. } => "status_update",
            ProgressEvent::InsightProgress { .. } => "insight_progress",
            ProgressEvent::InsightsComplete { .. } => "insights_complete",
        }
    }

    /// Whether no further events follow for this job.
    pub fn is_final(&self) -> bool {
        match self {
            ProgressEvent::InsightsComplete { .. } => true,
            ProgressEvent::StatusUpdate { status, .. } => status.is_terminal(),
            ProgressEvent::InsightProgress { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_with_type_tag() {
        let event = ProgressEvent::step("f", 2, 3);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "insight_progress");
        assert_eq!(json["current_step_num"], 3);
        assert_eq!(json["progress"], 75.0);
        assert!(json["timestamp"].is_string());
        assert_eq!(event.kind(), "insight_progress");
    }

    #[test]
    fn test_final_events() {
        assert!(ProgressEvent::complete("f", 1, 0.2).is_final());
        assert!(ProgressEvent::status("f", JobStatus::Failed, "x").is_final());
        assert!(!ProgressEvent::status("f", JobStatus::Processing, "x").is_final());
    }
}
