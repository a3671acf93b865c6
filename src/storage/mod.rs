//! Storage module for uploaded files
//!
//! Provides the Aliyun OSS bucket adapter uploaders store, read and link files through.

mod bucket;
mod file;
#[cfg(test)]
mod memory;

pub use bucket::{
    normalize_path, AliyunBucket, FetchedObject, StorageError, StoreOptions, UrlOptions,
    DEFAULT_CONTENT_TYPE, PRIVATE_URL_EXPIRES,
};
pub use file::StoredFile;
