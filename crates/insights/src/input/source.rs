//! Metadata about an uploaded source file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata about the source data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name as uploaded.
    pub file: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, ...).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was parsed.
    pub analyzed_at: DateTime<Utc>,
}

impl SourceMetadata {
    pub fn new(
        file: impl Into<String>,
        bytes: &[u8],
        format: impl Into<String>,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        Self {
            file: file.into(),
            hash: content_hash(bytes),
            size_bytes: bytes.len() as u64,
            format: format.into(),
            row_count,
            column_count,
            analyzed_at: Utc::now(),
        }
    }
}

/// `sha256:<hex>` digest of the raw bytes.
pub(crate) fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Lower-cased extension of a file name, without the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("sales.CSV").as_deref(), Some("csv"));
        assert_eq!(extension_of("archive.tar.xlsx").as_deref(), Some("xlsx"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_metadata_hash_is_stable() {
        let a = SourceMetadata::new("a.csv", b"x,y\n1,2\n", "csv", 1, 2);
        let b = SourceMetadata::new("b.csv", b"x,y\n1,2\n", "csv", 1, 2);
        assert_eq!(a.hash, b.hash);
        assert!(a.hash.starts_with("sha256:"));
        assert_eq!(a.size_bytes, 8);
    }
}
