//! Aliyun OSS client
//!
//! Object calls go through an OpenDAL [`Operator`] on the `oss` service, which
//! signs requests and presigns share links. One operator is bound to one endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use opendal::layers::LoggingLayer;
use opendal::services::Oss;
use opendal::{Metadata, Operator};
use reqwest::header::HeaderValue;
use tracing::{debug, instrument};

use super::{Endpoint, OssError};

/// Access key pair for one Aliyun account
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl Credentials {
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Credentials {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"<redacted>")
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Headers sent with an upload, validated as HTTP header values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    content_type: String,
    content_disposition: Option<String>,
}

impl PutOptions {
    pub fn new(content_type: &str, content_disposition: Option<&str>) -> Result<Self, OssError> {
        check_header("Content-Type", content_type)?;
        if let Some(disposition) = content_disposition {
            check_header("Content-Disposition", disposition)?;
        }

        Ok(PutOptions {
            content_type: content_type.to_string(),
            content_disposition: content_disposition.map(String::from),
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_disposition(&self) -> Option<&str> {
        self.content_disposition.as_deref()
    }
}

fn check_header(name: &'static str, value: &str) -> Result<(), OssError> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| OssError::InvalidHeader {
            name,
            value: value.to_string(),
        })
}

/// Metadata OSS returns alongside an object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
    /// ETag with the surrounding quotes removed
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<&Metadata> for ObjectMetadata {
    fn from(meta: &Metadata) -> Self {
        ObjectMetadata {
            content_type: meta.content_type().map(String::from),
            content_length: Some(meta.content_length()),
            content_disposition: meta.content_disposition().map(String::from),
            etag: meta.etag().map(|v| v.trim_matches('"').to_string()),
            // Displayed as RFC 3339 or as chrono's default, both of which parse
            last_modified: meta
                .last_modified()
                .and_then(|t| t.to_string().parse::<DateTime<Utc>>().ok()),
        }
    }
}

/// An object being downloaded: metadata up front, body as a chunk stream
pub struct ObjectReader {
    pub metadata: ObjectMetadata,
    pub chunks: BoxStream<'static, Result<Bytes, OssError>>,
}

impl fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectReader")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// The object calls the storage adapter makes against one bucket endpoint
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Upload `body` under `key`
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        options: &PutOptions,
    ) -> Result<(), OssError>;

    /// Start downloading `key`
    async fn get_object(&self, key: &str) -> Result<ObjectReader, OssError>;

    /// Remove `key`. Keys that do not exist are not an error.
    async fn delete_object(&self, key: &str) -> Result<(), OssError>;

    /// Presigned GET link for `key`, valid for `expires_in`
    async fn share_link(&self, key: &str, expires_in: Duration) -> Result<String, OssError>;
}

/// OSS operator bound to one bucket on one endpoint
#[derive(Clone)]
pub struct OssClient {
    op: Operator,
    endpoint: String,
}

impl OssClient {
    /// Client for `bucket` on the https endpoint of `endpoint` in `area`
    pub fn new(
        endpoint: Endpoint,
        area: &str,
        bucket: &str,
        credentials: &Credentials,
    ) -> Result<Self, OssError> {
        let url = format!("https://{}", endpoint.host(area));
        Self::with_endpoint(&url, bucket, credentials)
    }

    /// Client on an explicit endpoint URL, e.g. an accelerated or proxied domain
    pub fn with_endpoint(
        endpoint: &str,
        bucket: &str,
        credentials: &Credentials,
    ) -> Result<Self, OssError> {
        let builder = Oss::default()
            .bucket(bucket)
            .endpoint(endpoint)
            .access_key_id(&credentials.access_key_id)
            .access_key_secret(&credentials.access_key_secret);

        let op = Operator::new(builder)?
            .layer(LoggingLayer::default())
            .finish();

        Ok(OssClient {
            op,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL, without the bucket
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for OssClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectClient for OssClient {
    #[instrument(skip(self, body, options), fields(endpoint = %self.endpoint, size = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        options: &PutOptions,
    ) -> Result<(), OssError> {
        let mut write = self
            .op
            .write_with(key, body)
            .content_type(options.content_type());
        if let Some(disposition) = options.content_disposition() {
            write = write.content_disposition(disposition);
        }

        write.await?;
        Ok(())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_object(&self, key: &str) -> Result<ObjectReader, OssError> {
        let metadata = ObjectMetadata::from(&self.op.stat(key).await?);
        let reader = self.op.reader(key).await?;
        let chunks = reader
            .into_bytes_stream(..)
            .await?
            .map(|chunk| chunk.map_err(OssError::from))
            .boxed();

        debug!(key = %key, size = ?metadata.content_length, "Opened object stream");
        Ok(ObjectReader { metadata, chunks })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn delete_object(&self, key: &str) -> Result<(), OssError> {
        self.op.delete(key).await?;
        Ok(())
    }

    async fn share_link(&self, key: &str, expires_in: Duration) -> Result<String, OssError> {
        let request = self.op.presign_read(key, expires_in).await?;
        Ok(request.uri().to_string())
    }
}
