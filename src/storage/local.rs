use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{object_url, validate_object_path, BlobStore, StorageError};

/// Filesystem-backed store for development and tests. Objects live below
/// `root`; URLs use the same layout as the remote store so knowledge URLs
/// parse identically.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    api_base: String,
    bucket: String,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, api_base: &str, bucket: &str) -> Self {
        Self {
            root,
            api_base: api_base.to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_object_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file = self.resolve(path)?;
        log::debug!("Reading local object {}", file.display());

        fs::read(&file).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io(e.to_string()),
        })
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        fs::write(&file, bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        log::info!("Stored local object {}", file.display());
        Ok(self.download_url(path))
    }

    fn download_url(&self, path: &str) -> String {
        object_url(&self.api_base, &self.bucket, path)
    }
}
