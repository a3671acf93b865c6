use thiserror::Error;

/// Errors returned by OSS or the local side of a call
#[derive(Debug, Error)]
pub enum OssError {
    #[error("OSS error: {0}")]
    Service(#[from] opendal::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {name} header value: {value:?}")]
    InvalidHeader { name: &'static str, value: String },
}

impl OssError {
    /// Whether the object did not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, OssError::Service(e) if e.kind() == opendal::ErrorKind::NotFound)
    }
}
