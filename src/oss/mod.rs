//! Aliyun OSS client
//!
//! Thin object client over OpenDAL's `oss` service, plus the [`Connector`]
//! seam that decides how endpoint clients are built.

mod client;
mod connector;
mod endpoint;
mod error;

pub use client::{Credentials, ObjectClient, ObjectMetadata, ObjectReader, OssClient, PutOptions};
pub use connector::{Connector, OssConnector};
pub use endpoint::Endpoint;
pub use error::OssError;
