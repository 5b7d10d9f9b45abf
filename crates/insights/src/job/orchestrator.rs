//! Job orchestrator: accepts processing requests and drives each job to a terminal state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, watch, Mutex};

use crate::analysis::{AnalyzerSet, CancelFlag};
use crate::config::{InsightConfig, ReprocessPolicy};
use crate::error::{InsightError, Result};
use crate::input::{extension_of, Parser, ParserConfig};
use crate::insight::Insight;
use crate::ranking::InsightRanker;
use crate::schema::Dataset;

use super::model::{InsightReport, Job, JobStatus, JobSummary, JobUpdate};
use super::progress::ProgressEvent;
use super::store::JobStore;
use super::uploads::{upload_key, UploadStore};

const EVENT_CAPACITY: usize = 256;

/// Handle to the background run of one job.
struct ActiveRun {
    cancel: CancelFlag,
    done: watch::Receiver<bool>,
}

struct Inner {
    config: InsightConfig,
    store: Arc<dyn JobStore>,
    uploads: Arc<dyn UploadStore>,
    analyzers: AnalyzerSet,
    ranker: InsightRanker,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    runs: Mutex<HashMap<String, ActiveRun>>,
    events: broadcast::Sender<ProgressEvent>,
}

/// Runs the parse, analyze, rank pipeline for submitted jobs.
///
/// Cheap to clone; clones share the same stores, locks and event channel.
/// Every status write for a file identifier happens under that identifier's
/// lock, so at most one run is active per identifier.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator with the default analyzer set.
    pub fn new(
        config: InsightConfig,
        store: Arc<dyn JobStore>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        let analyzers = AnalyzerSet::new(&config.analysis);
        Self::with_analyzers(config, store, uploads, analyzers)
    }

    /// Create an orchestrator with an explicit analyzer set.
    pub fn with_analyzers(
        config: InsightConfig,
        store: Arc<dyn JobStore>,
        uploads: Arc<dyn UploadStore>,
        analyzers: AnalyzerSet,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                ranker: InsightRanker::from_config(&config),
                config,
                store,
                uploads,
                analyzers,
                locks: Mutex::new(HashMap::new()),
                runs: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.inner.store
    }

    pub fn uploads(&self) -> &Arc<dyn UploadStore> {
        &self.inner.uploads
    }

    /// Accept a job for processing and start it in the background.
    ///
    /// Returns once the job is `processing`. Fails with `NotFound` for an
    /// unknown identifier and `InvalidState` when the job is already running
    /// or its terminal state may not be reprocessed.
    pub async fn submit_processing(&self, file_id: &str) -> Result<JobSummary> {
        let lock = self.inner.lock_for(file_id).await;
        let accepted = {
            let _guard = lock.lock().await;
            self.accept(file_id).await
        };
        self.inner.release_lock(file_id, lock).await;
        accepted
    }

    /// Accept check and `processing` write; caller holds the identifier's lock.
    async fn accept(&self, file_id: &str) -> Result<JobSummary> {
        let job = self.inner.store.get_job(file_id).await?;
        if !self.inner.accepts(job.status) {
            tracing::debug!(file_id, status = %job.status, "processing request rejected");
            return Err(InsightError::InvalidState {
                file_id: file_id.to_string(),
                status: job.status,
            });
        }

        let job = self
            .inner
            .store
            .update_job_status(file_id, JobUpdate::processing())
            .await?;

        let cancel = CancelFlag::new();
        let (done_tx, done_rx) = watch::channel(false);
        self.inner.runs.lock().await.insert(
            file_id.to_string(),
            ActiveRun {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        tracing::info!(file_id, filename = %job.filename, "job accepted");
        self.inner.publish(ProgressEvent::status(
            file_id,
            JobStatus::Processing,
            "Starting analysis...",
        ));

        let inner = Arc::clone(&self.inner);
        let summary = job.summary();
        tokio::spawn(async move {
            inner.run_job(job, cancel, done_tx).await;
        });

        Ok(summary)
    }

    /// Current status of a job.
    pub async fn get_status(&self, file_id: &str) -> Result<JobSummary> {
        Ok(self.inner.store.get_job(file_id).await?.summary())
    }

    /// Ranked insights of a completed job; `NotReady` otherwise.
    pub async fn get_insights(&self, file_id: &str) -> Result<InsightReport> {
        let job = self.inner.store.get_job(file_id).await?;
        if job.status != JobStatus::Completed {
            return Err(InsightError::NotReady {
                file_id: file_id.to_string(),
                status: job.status,
            });
        }

        Ok(InsightReport {
            total_insights: job.insights.len(),
            processing_time: job.processing_time_seconds.unwrap_or(0.0),
            file_id: job.file_id,
            insights: job.insights,
        })
    }

    /// Wait for an active run to finish and return the stored job.
    ///
    /// Returns immediately when nothing is running for the identifier.
    pub async fn wait(&self, file_id: &str) -> Result<Job> {
        let done = self
            .inner
            .runs
            .lock()
            .await
            .get(file_id)
            .map(|run| run.done.clone());

        if let Some(mut done) = done {
            // A dropped sender means the run already ended.
            let _ = done.wait_for(|finished| *finished).await;
        }
        self.inner.store.get_job(file_id).await
    }

    /// Ask an active run to stop at its next checkpoint.
    ///
    /// The job ends `failed` with "processing cancelled". Fails with
    /// `InvalidState` when the job is not running.
    pub async fn cancel(&self, file_id: &str) -> Result<()> {
        if let Some(run) = self.inner.runs.lock().await.get(file_id) {
            run.cancel.cancel();
            tracing::info!(file_id, "cancellation requested");
            return Ok(());
        }

        let job = self.inner.store.get_job(file_id).await?;
        Err(InsightError::InvalidState {
            file_id: file_id.to_string(),
            status: job.status,
        })
    }

    /// Receive progress events for every job.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.inner.events.subscribe()
    }

    /// Whether a run is currently active for the identifier.
    pub async fn is_running(&self, file_id: &str) -> bool {
        self.inner.runs.lock().await.contains_key(file_id)
    }
}

impl Inner {
    async fn lock_for(&self, file_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(file_id.to_string()).or_default())
    }

    /// Drop the identifier's lock entry once nobody else holds or awaits it.
    /// The guard taken from `lock` must already be released.
    async fn release_lock(&self, file_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(file_id);
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }

    fn accepts(&self, status: JobStatus) -> bool {
        match status {
            JobStatus::Pending => true,
            JobStatus::Failed => self.config.jobs.reprocess == ReprocessPolicy::FailedOnly,
            JobStatus::Processing | JobStatus::Completed => false,
        }
    }

    fn publish(&self, event: ProgressEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Background body of one run. Always leaves the job terminal unless the
    /// store itself is unavailable.
    async fn run_job(&self, job: Job, cancel: CancelFlag, done: watch::Sender<bool>) {
        let file_id = job.file_id.clone();
        let started = Instant::now();
        let outcome = self.execute(&job, &cancel).await;
        let elapsed = started.elapsed().as_secs_f64();

        let lock = self.lock_for(&file_id).await;
        {
            let _guard = lock.lock().await;
            self.record(&file_id, outcome, elapsed).await;
            self.runs.lock().await.remove(&file_id);
        }
        self.release_lock(&file_id, lock).await;
        let _ = done.send(true);
    }

    /// Write the terminal status of a run.
    async fn record(&self, file_id: &str, outcome: Result<Vec<Insight>>, elapsed: f64) {
        match outcome {
            Ok(insights) => {
                let count = insights.len();
                match self
                    .store
                    .update_job_status(file_id, JobUpdate::completed(insights, elapsed))
                    .await
                {
                    Ok(_) => {
                        tracing::info!(
                            file_id = %file_id,
                            insights = count,
                            elapsed_secs = elapsed,
                            "job completed"
                        );
                        self.publish(ProgressEvent::complete(file_id, count, elapsed));
                    }
                    Err(e) => {
                        tracing::error!(file_id = %file_id, error = %e, "failed to store results");
                        self.fail(file_id, format!("failed to store results: {}", e), elapsed)
                            .await;
                    }
                }
            }
            Err(e) => self.fail(file_id, e.to_string(), elapsed).await,
        }
    }

    async fn fail(&self, file_id: &str, error: String, elapsed: f64) {
        match self
            .store
            .update_job_status(file_id, JobUpdate::failed(error.clone(), Some(elapsed)))
            .await
        {
            Ok(_) => {
                tracing::warn!(file_id, error = %error, "job failed");
                self.publish(ProgressEvent::status(
                    file_id,
                    JobStatus::Failed,
                    format!("Analysis failed: {}", error),
                ));
            }
            Err(e) => {
                tracing::error!(file_id, error = %e, "could not record job failure");
            }
        }
    }

    /// Load, parse, analyze and rank. Nothing is written to the store here.
    async fn execute(&self, job: &Job, cancel: &CancelFlag) -> Result<Vec<Insight>> {
        let file_id = job.file_id.as_str();

        self.publish(ProgressEvent::step(file_id, 0, 0));
        let bytes = self
            .uploads
            .get(&upload_key(file_id, &job.filename))
            .await?;
        let extension = extension_of(&job.filename).unwrap_or_default();
        let parser = Parser::with_config(ParserConfig::from(self.config.dataset.clone()));
        let dataset = tokio::task::spawn_blocking(move || parser.parse(&bytes, &extension))
            .await
            .map_err(|e| InsightError::parse(e.to_string()))??;
        cancel.check()?;

        self.publish(ProgressEvent::step(file_id, 1, 0));
        self.check_limits(&dataset)?;
        tracing::debug!(
            file_id,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "dataset parsed"
        );

        self.publish(ProgressEvent::step(file_id, 2, 0));
        let candidates = self.analyzers.run(Arc::new(dataset), cancel).await?;

        self.publish(ProgressEvent::step(file_id, 3, candidates.len()));
        let ranked = self.ranker.rank(candidates);
        cancel.check()?;

        Ok(ranked)
    }

    fn check_limits(&self, dataset: &Dataset) -> Result<()> {
        let limits = &self.config.dataset;
        if let Some(max_rows) = limits.max_rows.filter(|&m| dataset.row_count() > m) {
            return Err(InsightError::Validation(format!(
                "dataset too large: {} rows exceeds the limit of {}",
                dataset.row_count(),
                max_rows
            )));
        }
        if let Some(max_columns) = limits.max_columns.filter(|&m| dataset.column_count() > m) {
            return Err(InsightError::Validation(format!(
                "dataset too large: {} columns exceeds the limit of {}",
                dataset.column_count(),
                max_columns
            )));
        }
        Ok(())
    }
}
