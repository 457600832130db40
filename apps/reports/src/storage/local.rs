use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::StorageError;
use crate::storage::{validate_key, ReportStorage, StorageMode};

/// Files under a root directory; parent directories are created on save.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key.trim()))
    }
}

fn not_found(key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl ReportStorage for LocalStorage {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "pdf_saved_local");
        Ok(key.trim().to_string())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| not_found(key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found(key, e))
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("pdfs"));

        let key = storage.save("282.pdf", b"%PDF-1.7 test").await.unwrap();
        assert_eq!(key, "282.pdf");
        assert!(dir.path().join("pdfs/282.pdf").exists());
        assert_eq!(storage.load(&key).await.unwrap(), b"%PDF-1.7 test");

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.load(&key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_nested_keys_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.save("2026/01/9.pdf", b"x").await.unwrap();
        assert_eq!(storage.load("2026/01/9.pdf").await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(matches!(
            storage.save("../outside.pdf", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.delete("/tmp/x.pdf").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_unwritable_root_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let storage = LocalStorage::new(&blocker);
        assert!(matches!(
            storage.save("1.pdf", b"x").await,
            Err(StorageError::Io(_))
        ));
    }
}
