//! Aliyun Bucket
//!
//! Aliyun Object Storage Service (OSS) backend for file uploaders: store, fetch
//! and delete objects, and build public or signed URLs for them.
//!
//! ```no_run
//! use aliyun_bucket::{AliyunBucket, AliyunSettings, StoreOptions, UrlOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = AliyunSettings::new("access-id", "access-key", "photos");
//! let bucket = AliyunBucket::new(&settings)?;
//!
//! let url = bucket
//!     .store_bytes("/avatars/1.png", "png bytes".into(), &StoreOptions::default())
//!     .await?;
//! assert_eq!(url, "https://photos.oss-cn-hangzhou.aliyuncs.com/avatars/1.png");
//!
//! let thumb = bucket
//!     .private_url("avatars/1.png", &UrlOptions::thumb("@!small"))
//!     .await?;
//! # let _ = thumb;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod oss;
pub mod storage;

pub use crate::config::{AliyunSettings, Settings};
pub use crate::oss::{Endpoint, ObjectMetadata, OssError, PutOptions};
pub use crate::storage::{
    AliyunBucket, FetchedObject, StorageError, StoreOptions, StoredFile, UrlOptions,
};
