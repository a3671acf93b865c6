use std::sync::Arc;

use tracing::debug;

use super::{Credentials, Endpoint, ObjectClient, OssClient, OssError};
use crate::config::AliyunSettings;

/// Builds the client for one endpoint of the configured bucket
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: Endpoint) -> Result<Arc<dyn ObjectClient>, OssError>;
}

/// Connects to the real OSS endpoints of one region
#[derive(Debug, Clone)]
pub struct OssConnector {
    credentials: Credentials,
    bucket: String,
    area: String,
}

impl OssConnector {
    pub fn new(settings: &AliyunSettings) -> Self {
        OssConnector {
            credentials: Credentials::new(&settings.access_id, &settings.access_key),
            bucket: settings.bucket.clone(),
            area: settings.area.clone(),
        }
    }
}

impl Connector for OssConnector {
    fn connect(&self, endpoint: Endpoint) -> Result<Arc<dyn ObjectClient>, OssError> {
        let client = OssClient::new(endpoint, &self.area, &self.bucket, &self.credentials)?;
        debug!(endpoint = %endpoint, url = %client.endpoint(), "Created OSS client");
        Ok(Arc::new(client))
    }
}
