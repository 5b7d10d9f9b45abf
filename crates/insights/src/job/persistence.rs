//! JSON-file job store: one pretty-printed file per job.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{InsightError, Result};

use super::model::{Job, JobStatus, JobUpdate};
use super::store::JobStore;

/// Error recorded on jobs found mid-run at startup.
pub const INTERRUPTED_ERROR: &str = "processing interrupted by restart";

/// Stores each job as `<file_id>.json` under a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash never leaves a half-written record.
#[derive(Debug)]
pub struct JsonJobStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonJobStore {
    /// Open (and create if needed) a store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Mark every job left in `processing` by a previous process as failed.
    ///
    /// Returns the number of jobs updated.
    pub async fn fail_interrupted(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut failed = 0;
        for mut job in self.list_unlocked().await? {
            if job.status != JobStatus::Processing {
                continue;
            }
            job.apply(JobUpdate::failed(INTERRUPTED_ERROR, None))?;
            self.write(&job).await?;
            tracing::warn!(file_id = %job.file_id, "marked interrupted job as failed");
            failed += 1;
        }
        Ok(failed)
    }

    /// All stored jobs, in no particular order.
    pub async fn list(&self) -> Result<Vec<Job>> {
        self.list_unlocked().await
    }

    async fn list_unlocked(&self) -> Result<Vec<Job>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to read directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut jobs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| InsightError::Persistence(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                jobs.push(self.read(&path).await?);
            }
        }
        Ok(jobs)
    }

    fn path_for(&self, file_id: &str) -> Option<PathBuf> {
        is_safe_id(file_id).then(|| self.dir.join(format!("{}.json", file_id)))
    }

    async fn read(&self, path: &Path) -> Result<Job> {
        let bytes = fs::read(path).await.map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to parse job '{}': {}",
                path.display(),
                e
            ))
        })
    }

    async fn load(&self, file_id: &str) -> Result<Job> {
        let path = self
            .path_for(file_id)
            .ok_or_else(|| InsightError::not_found(file_id))?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(InsightError::not_found(file_id));
        }
        self.read(&path).await
    }

    async fn write(&self, job: &Job) -> Result<()> {
        let path = self
            .path_for(&job.file_id)
            .ok_or_else(|| InsightError::Validation(format!("invalid file id '{}'", job.file_id)))?;
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(job)?;
        fs::write(&tmp, bytes).await.map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to create file '{}': {}",
                tmp.display(),
                e
            ))
        })?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            InsightError::Persistence(format!(
                "Failed to replace '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl JobStore for JsonJobStore {
    async fn get_job(&self, file_id: &str) -> Result<Job> {
        self.load(file_id).await
    }

    async fn create_job(
        &self,
        file_id: &str,
        filename: &str,
        upload_time: DateTime<Utc>,
    ) -> Result<Job> {
        let _guard = self.write_lock.lock().await;
        match self.load(file_id).await {
            Ok(_) => {
                return Err(InsightError::Persistence(format!(
                    "job '{}' already exists",
                    file_id
                )))
            }
            Err(InsightError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        let job = Job::new(file_id, filename, upload_time);
        self.write(&job).await?;
        Ok(job)
    }

    async fn update_job_status(&self, file_id: &str, update: JobUpdate) -> Result<Job> {
        let _guard = self.write_lock.lock().await;
        let mut job = self.load(file_id).await?;
        job.apply(update)?;
        self.write(&job).await?;
        Ok(job)
    }
}

/// Identifiers become file names, so only allow a conservative alphabet.
fn is_safe_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
