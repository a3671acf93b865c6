//! Per-file view of a stored object

use std::path::Path;

use bytes::Bytes;

use super::bucket::{normalize_path, AliyunBucket, StorageError, StoreOptions, UrlOptions};
use crate::oss::{Connector, OssConnector};

/// A single object in an [`AliyunBucket`], addressed by its storage path
#[derive(Debug)]
pub struct StoredFile<'a, C = OssConnector> {
    bucket: &'a AliyunBucket<C>,
    path: String,
}

impl<'a, C: Connector> StoredFile<'a, C> {
    pub(crate) fn new(bucket: &'a AliyunBucket<C>, path: &str) -> Self {
        StoredFile {
            bucket,
            path: path.to_string(),
        }
    }

    /// Storage path as given
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Signed URL for private buckets, public URL otherwise
    pub async fn url(&self, options: &UrlOptions) -> Result<String, StorageError> {
        self.bucket.url(&self.path, options).await
    }

    pub async fn store(&self, file: &Path, options: &StoreOptions) -> Result<String, StorageError> {
        self.bucket.store(&self.path, file, options).await
    }

    pub async fn store_bytes(
        &self,
        body: Bytes,
        options: &StoreOptions,
    ) -> Result<String, StorageError> {
        self.bucket.store_bytes(&self.path, body, options).await
    }

    /// Object content
    pub async fn read(&self) -> Result<Bytes, StorageError> {
        Ok(self.bucket.fetch(&self.path).await?.body)
    }

    pub async fn delete(&self) -> Result<String, StorageError> {
        self.bucket.delete(&self.path).await
    }

    /// `Content-Type` recorded for the object, if any
    pub async fn content_type(&self) -> Result<Option<String>, StorageError> {
        let metadata = self.bucket.head(normalize_path(&self.path)).await?;
        Ok(metadata.content_type)
    }
}
