//! Aliyun OSS bucket adapter for file uploaders
//!
//! Stores, fetches and deletes objects and builds their public or signed URLs.
//!
//! ## Endpoints
//! ```text
//! store / fetch / delete  ->  upload client  (oss-{area}, or oss-{area}-internal)
//! head / private_url      ->  oss client     (oss-{area})
//! private_url with thumb  ->  img client     (img-{area})
//! ```
//!
//! The upload client uses the internal endpoint when `internal` is set.
//!
//! Each client is built on first use and kept for the life of the bucket.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::file::StoredFile;
use crate::config::AliyunSettings;
use crate::oss::{
    Connector, Endpoint, ObjectClient, ObjectMetadata, ObjectReader, OssConnector, OssError,
    PutOptions,
};

/// Lifetime of links returned by [`AliyunBucket::private_url`]
pub const PRIVATE_URL_EXPIRES: Duration = Duration::from_secs(3600);

/// Content type used when a store does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpg";

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("aliyun host must include // (http:// or https://), but got: {0}")]
    InvalidHost(String),

    #[error("Put file failed: {path}")]
    StoreFailed {
        path: String,
        #[source]
        source: OssError,
    },

    #[error("Get content failed: {path}")]
    FetchFailed {
        path: String,
        #[source]
        source: OssError,
    },

    #[error("Delete failed: {path}")]
    DeleteFailed {
        path: String,
        #[source]
        source: OssError,
    },

    #[error("OSS error: {0}")]
    Remote(#[from] OssError),

    #[error("Failed to create OSS client: {0}")]
    Client(#[source] OssError),
}

/// Headers applied to a store
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Defaults to [`DEFAULT_CONTENT_TYPE`]
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

impl StoreOptions {
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn content_disposition(mut self, content_disposition: &str) -> Self {
        self.content_disposition = Some(content_disposition.to_string());
        self
    }
}

/// URL variant selection
#[derive(Debug, Clone, Default)]
pub struct UrlOptions {
    /// Suffix appended to the path as-is, e.g. an image style `@!small`
    pub thumb: Option<String>,
}

impl UrlOptions {
    pub fn thumb(thumb: &str) -> Self {
        UrlOptions {
            thumb: Some(thumb.to_string()),
        }
    }
}

/// Object content together with the metadata OSS returned for it
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub metadata: ObjectMetadata,
    pub body: Bytes,
}

/// Strip one leading `/` from a storage path
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// One OSS bucket as seen by an uploader
pub struct AliyunBucket<C = OssConnector> {
    connector: C,
    bucket: String,
    host: String,
    private_read: bool,
    internal: bool,
    oss_client: OnceCell<Arc<dyn ObjectClient>>,
    img_client: OnceCell<Arc<dyn ObjectClient>>,
    upload_client: OnceCell<Arc<dyn ObjectClient>>,
}

impl AliyunBucket<OssConnector> {
    /// Create a bucket talking to the real OSS endpoints
    pub fn new(settings: &AliyunSettings) -> Result<Self, StorageError> {
        Self::with_connector(settings, OssConnector::new(settings))
    }
}

impl<C: Connector> AliyunBucket<C> {
    /// Create a bucket whose endpoint clients come from `connector`
    pub fn with_connector(settings: &AliyunSettings, connector: C) -> Result<Self, StorageError> {
        let host = settings.public_host();
        if !host.contains("//") {
            return Err(StorageError::InvalidHost(host));
        }

        debug!(
            bucket = %settings.bucket,
            area = %settings.area,
            host = %host,
            internal = settings.internal,
            private_read = settings.private_read,
            "Creating bucket adapter"
        );

        Ok(AliyunBucket {
            connector,
            bucket: settings.bucket.clone(),
            host,
            private_read: settings.private_read,
            internal: settings.internal,
            oss_client: OnceCell::new(),
            img_client: OnceCell::new(),
            upload_client: OnceCell::new(),
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Host public URLs are built on
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether URLs are signed
    pub fn is_private(&self) -> bool {
        self.private_read
    }

    /// Handle on the object stored at `path`
    pub fn file(&self, path: &str) -> StoredFile<'_, C> {
        StoredFile::new(self, path)
    }

    fn oss_client(&self) -> Result<&Arc<dyn ObjectClient>, OssError> {
        self.oss_client
            .get_or_try_init(|| self.connector.connect(Endpoint::Standard))
    }

    fn img_client(&self) -> Result<&Arc<dyn ObjectClient>, OssError> {
        self.img_client
            .get_or_try_init(|| self.connector.connect(Endpoint::Image))
    }

    fn upload_client(&self) -> Result<&Arc<dyn ObjectClient>, OssError> {
        self.upload_client.get_or_try_init(|| {
            let endpoint = if self.internal {
                Endpoint::Internal
            } else {
                Endpoint::Standard
            };
            self.connector.connect(endpoint)
        })
    }

    /// Upload a local file to `path`, returning its public URL
    #[instrument(skip(self, options), fields(bucket = %self.bucket))]
    pub async fn store(
        &self,
        path: &str,
        file: &Path,
        options: &StoreOptions,
    ) -> Result<String, StorageError> {
        let data = match tokio::fs::read(file).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read file for upload");
                return Err(StorageError::StoreFailed {
                    path: normalize_path(path).to_string(),
                    source: OssError::Io(e),
                });
            }
        };

        self.store_bytes(path, Bytes::from(data), options).await
    }

    /// Upload `body` to `path`, returning its public URL
    ///
    /// Header values that are not valid HTTP fail the store before anything is sent.
    #[instrument(skip(self, body, options), fields(bucket = %self.bucket, size = body.len()))]
    pub async fn store_bytes(
        &self,
        path: &str,
        body: Bytes,
        options: &StoreOptions,
    ) -> Result<String, StorageError> {
        let key = normalize_path(path);
        let size = body.len();

        match self.put(key, body, options).await {
            Ok(()) => {
                info!(key = %key, size, "Stored object");
                Ok(self.public_url(key, &UrlOptions::default()))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Store failed");
                Err(StorageError::StoreFailed {
                    path: key.to_string(),
                    source: e,
                })
            }
        }
    }

    async fn put(&self, key: &str, body: Bytes, options: &StoreOptions) -> Result<(), OssError> {
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let put = PutOptions::new(content_type, options.content_disposition.as_deref())?;

        self.upload_client()?.put_object(key, body, &put).await
    }

    /// Download the object at `path` into memory
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn fetch(&self, path: &str) -> Result<FetchedObject, StorageError> {
        let key = normalize_path(path);

        let result = match self.upload_client() {
            Ok(client) => match client.get_object(key).await {
                Ok(reader) => read_to_end(reader).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(object) => {
                debug!(key = %key, size = object.body.len(), "Fetched object");
                Ok(object)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Fetch failed");
                Err(StorageError::FetchFailed {
                    path: key.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Remove the object at `path`, returning the URL it used to be served from
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn delete(&self, path: &str) -> Result<String, StorageError> {
        let key = normalize_path(path);

        let result = match self.upload_client() {
            Ok(client) => client.delete_object(key).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(key = %key, "Deleted object");
                Ok(self.public_url(key, &UrlOptions::default()))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Delete failed");
                Err(StorageError::DeleteFailed {
                    path: key.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Metadata of the object at `path`
    ///
    /// Issues a full GetObject on the standard endpoint and discards the body.
    /// `path` is used verbatim.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn head(&self, path: &str) -> Result<ObjectMetadata, StorageError> {
        let client = self.oss_client().map_err(StorageError::Client)?;
        let reader = client.get_object(path).await?;
        let object = read_to_end(reader).await?;
        Ok(object.metadata)
    }

    /// Public URL for `path`, which is used verbatim
    pub fn public_url(&self, path: &str, options: &UrlOptions) -> String {
        match &options.thumb {
            Some(thumb) => format!("{}/{}{}", self.host, path, thumb),
            None => format!("{}/{}", self.host, path),
        }
    }

    /// Signed, time-limited https URL for `path`
    ///
    /// Thumbnails are signed against the image endpoint.
    pub async fn private_url(
        &self,
        path: &str,
        options: &UrlOptions,
    ) -> Result<String, StorageError> {
        let key = normalize_path(path);

        let url = match &options.thumb {
            Some(thumb) => {
                let thumb_key = format!("{}{}", key, thumb);
                let client = self.img_client().map_err(StorageError::Client)?;
                client.share_link(&thumb_key, PRIVATE_URL_EXPIRES).await?
            }
            None => {
                let client = self.oss_client().map_err(StorageError::Client)?;
                client.share_link(key, PRIVATE_URL_EXPIRES).await?
            }
        };

        Ok(url.replace("http://", "https://"))
    }

    /// URL a reader should use: signed when the bucket is private, public otherwise
    pub async fn url(&self, path: &str, options: &UrlOptions) -> Result<String, StorageError> {
        if self.private_read {
            self.private_url(path, options).await
        } else {
            Ok(self.public_url(path, options))
        }
    }
}

impl<C> fmt::Debug for AliyunBucket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliyunBucket")
            .field("bucket", &self.bucket)
            .field("host", &self.host)
            .field("private_read", &self.private_read)
            .field("internal", &self.internal)
            .finish_non_exhaustive()
    }
}

/// Drain a download into one buffer
async fn read_to_end(reader: ObjectReader) -> Result<FetchedObject, OssError> {
    let ObjectReader { metadata, mut chunks } = reader;

    let mut body = BytesMut::new();
    while let Some(chunk) = chunks.next().await {
        body.extend_from_slice(&chunk?);
    }

    Ok(FetchedObject {
        metadata,
        body: body.freeze(),
    })
}
