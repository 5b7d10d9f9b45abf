//! Upload gateway: validate, parse, store and register a new job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::InsightConfig;
use crate::error::{InsightError, Result};
use crate::input::{extension_of, Parser, ParserConfig, SourceMetadata};
use crate::job::{upload_key, JobStatus, JobStore, UploadStore};

/// What the caller gets back after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub file_id: String,
    pub filename: String,
    pub status: JobStatus,
    pub upload_time: DateTime<Utc>,
    /// Header row followed by the first rows, as JSON values.
    pub preview: Vec<Vec<Value>>,
    pub source: SourceMetadata,
}

/// Entry point for new files.
///
/// A file that fails validation or parsing never gets a job; everything
/// accepted here starts out `pending`.
#[derive(Clone)]
pub struct UploadGateway {
    config: InsightConfig,
    store: Arc<dyn JobStore>,
    uploads: Arc<dyn UploadStore>,
}

impl UploadGateway {
    pub fn new(
        config: InsightConfig,
        store: Arc<dyn JobStore>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        Self {
            config,
            store,
            uploads,
        }
    }

    /// Accept an uploaded file.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        let filename = base_name(filename);
        let extension = self.validate(filename, bytes.len())?;

        let parser = Parser::with_config(ParserConfig::from(self.config.dataset.clone()));
        let (dataset, bytes, source) = {
            let name = filename.to_string();
            tokio::task::spawn_blocking(move || {
                let (dataset, source) = parser.parse_named(&name, &bytes)?;
                Ok::<_, InsightError>((dataset, bytes, source))
            })
            .await
            .map_err(|e| InsightError::parse(e.to_string()))??
        };
        tracing::debug!(
            filename,
            format = %extension,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "upload parsed"
        );

        let file_id = Uuid::new_v4().to_string();
        self.uploads
            .put(&upload_key(&file_id, filename), bytes)
            .await?;
        let job = self
            .store
            .create_job(&file_id, filename, Utc::now())
            .await?;
        tracing::info!(file_id = %file_id, filename, size = source.size_bytes, "upload accepted");

        Ok(UploadReceipt {
            file_id,
            filename: job.filename,
            status: job.status,
            upload_time: job.upload_time,
            preview: dataset.preview(self.config.upload.max_preview_rows),
            source,
        })
    }

    /// Check name and size; returns the lower-cased extension.
    fn validate(&self, filename: &str, size: usize) -> Result<String> {
        let extension = extension_of(filename).ok_or_else(|| {
            InsightError::Validation(format!("'{}' has no file extension", filename))
        })?;

        let allowed = self
            .config
            .upload
            .allowed_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(&extension));
        if !allowed || !Parser::supports(&extension) {
            return Err(InsightError::Validation(format!(
                "file type '.{}' is not allowed (allowed: {})",
                extension,
                self.config.upload.allowed_extensions.join(", ")
            )));
        }

        if size > self.config.upload.max_file_size {
            return Err(InsightError::Validation(format!(
                "file is {} bytes, larger than the {} byte limit",
                size, self.config.upload.max_file_size
            )));
        }
        if size == 0 {
            return Err(InsightError::parse("file is empty"));
        }

        Ok(extension)
    }
}

/// Drop any directory components a client may have sent.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}
