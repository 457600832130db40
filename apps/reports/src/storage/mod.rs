//! Persistence of rendered PDFs.
//!
//! Two backends share one trait: a local directory and an S3 bucket. Keys are
//! opaque relative paths such as `282.pdf`.

pub mod bucket;
pub mod local;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::errors::StorageError;

pub use bucket::{build_s3_client, BucketStorage};
pub use local::LocalStorage;

pub const DEFAULT_BUCKET_PREFIX: &str = "reports";
pub const DEFAULT_LOCAL_ROOT: &str = "storage/pdfs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Bucket,
}

impl StorageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Bucket => "bucket",
        }
    }
}

#[async_trait]
pub trait ReportStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the key to load it back with.
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn mode(&self) -> StorageMode;
}

/// Rejects keys that could escape the storage root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let trimmed = key.trim();
    let escapes = trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.starts_with('\\')
        || trimmed.split(['/', '\\']).any(|part| part == "..");
    if escapes {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Bucket storage when `PDF_STORAGE_BUCKET` is set, local storage otherwise.
/// `PDF_STORAGE_KEY` is the bucket prefix in the first case and the local root
/// in the second.
pub async fn build_storage(config: &Config) -> Box<dyn ReportStorage> {
    match &config.storage_bucket {
        Some(bucket) => {
            let client = build_s3_client(config).await;
            let prefix = config
                .storage_key
                .clone()
                .unwrap_or_else(|| DEFAULT_BUCKET_PREFIX.to_string());
            info!(bucket = %bucket, prefix = %prefix, "pdf_storage_bucket");
            Box::new(BucketStorage::new(client, bucket.clone(), Some(prefix)))
        }
        None => {
            let root = config
                .storage_key
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_ROOT.to_string());
            info!(root = %root, "pdf_storage_local");
            Box::new(LocalStorage::new(root))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("282.pdf").is_ok());
        assert!(validate_key("reports/282.pdf").is_ok());
        for bad in ["", "  ", "/etc/passwd", "../282.pdf", "a/../../b.pdf", "\\x.pdf"] {
            assert!(
                matches!(validate_key(bad), Err(StorageError::InvalidKey(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(StorageMode::Local.as_str(), "local");
        assert_eq!(StorageMode::Bucket.as_str(), "bucket");
    }
}
