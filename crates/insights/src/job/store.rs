//! Job repository interface and the in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{InsightError, Result};

use super::model::{Job, JobUpdate};

/// Repository for job records.
///
/// The orchestrator only relies on these three operations; storage engines
/// are free to persist however they like.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a job, or `NotFound`.
    async fn get_job(&self, file_id: &str) -> Result<Job>;

    /// Insert a new `pending` job. Fails if the identifier is taken.
    async fn create_job(
        &self,
        file_id: &str,
        filename: &str,
        upload_time: DateTime<Utc>,
    ) -> Result<Job>;

    /// Apply a status write and return the updated job.
    async fn update_job_status(&self, file_id: &str, update: JobUpdate) -> Result<Job>;
}

/// Jobs held in a map; lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_job(&self, file_id: &str) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| InsightError::not_found(file_id))
    }

    async fn create_job(
        &self,
        file_id: &str,
        filename: &str,
        upload_time: DateTime<Utc>,
    ) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(file_id) {
            return Err(InsightError::Persistence(format!(
                "job '{}' already exists",
                file_id
            )));
        }
        let job = Job::new(file_id, filename, upload_time);
        jobs.insert(file_id.to_string(), job.clone());
        Ok(job)
    }

    async fn update_job_status(&self, file_id: &str, update: JobUpdate) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(file_id)
            .ok_or_else(|| InsightError::not_found(file_id))?;
        job.apply(update)?;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    #[tokio::test]
    async fn test_create_get_update() {
        let store = MemoryJobStore::new();
        let created = store.create_job("a", "a.csv", Utc::now()).await.unwrap();
        assert_eq!(created.status, JobStatus::Pending);
        assert_eq!(store.get_job("a").await.unwrap(), created);

        let updated = store
            .update_job_status("a", JobUpdate::processing())
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Processing);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_ids() {
        let store = MemoryJobStore::new();
        assert!(matches!(
            store.get_job("missing").await,
            Err(InsightError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_job_status("missing", JobUpdate::processing()).await,
            Err(InsightError::NotFound { .. })
        ));

        store.create_job("a", "a.csv", Utc::now()).await.unwrap();
        assert!(store.create_job("a", "b.csv", Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_illegal_update_leaves_job_untouched() {
        let store = MemoryJobStore::new();
        store.create_job("a", "a.csv", Utc::now()).await.unwrap();
        assert!(store
            .update_job_status("a", JobUpdate::completed(Vec::new(), 1.0))
            .await
            .is_err());
        assert_eq!(store.get_job("a").await.unwrap().status, JobStatus::Pending);
    }
}
