//! Job lifecycle: records, stores, progress events and the orchestrator.

mod model;
mod orchestrator;
mod persistence;
mod progress;
mod store;
mod uploads;

pub use model::{InsightReport, Job, JobStatus, JobSummary, JobUpdate};
pub use orchestrator::Orchestrator;
pub use persistence::{JsonJobStore, INTERRUPTED_ERROR};
pub use progress::{ProgressEvent, STAGES};
pub use store::{JobStore, MemoryJobStore};
pub use uploads::{upload_key, FsUploadStore, MemoryUploadStore, UploadStore};
