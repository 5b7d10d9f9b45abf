//! Raw upload storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{InsightError, Result};
use crate::input::extension_of;

/// Storage key for an upload: `<file_id>.<ext>`.
pub fn upload_key(file_id: &str, filename: &str) -> String {
    match extension_of(filename) {
        Some(ext) => format!("{}.{}", file_id, ext),
        None => file_id.to_string(),
    }
}

/// Byte storage for uploaded files, keyed by [`upload_key`].
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Uploads written to a directory.
#[derive(Debug, Clone)]
pub struct FsUploadStore {
    dir: PathBuf,
}

impl FsUploadStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| InsightError::Io {
                path: dir.clone(),
                source: e,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let safe = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !safe || key.contains("..") {
            return Err(InsightError::Validation(format!("invalid upload key '{}'", key)));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl UploadStore for FsUploadStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| InsightError::Io { path, source: e })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| InsightError::Io { path, source: e })
    }
}

/// Uploads kept in memory; used by the one-shot CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryUploadStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadStore for MemoryUploadStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.files.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| InsightError::Persistence(format!("upload '{}' not found", key)))
    }
}
