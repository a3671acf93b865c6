//! In-memory endpoint clients for exercising the bucket adapter
//!
//! All endpoints of one connector share a single object map, the way the real
//! endpoints all front the same bucket. Every connect and call is recorded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use opendal::ErrorKind;
use parking_lot::Mutex;

use crate::oss::{
    Connector, Endpoint, ObjectClient, ObjectMetadata, ObjectReader, OssError, PutOptions,
};

const AREA: &str = "cn-hangzhou";
const CHUNK_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Put,
    Get,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Healthy,
    /// Every remote call fails
    Failing,
    /// Clients cannot be built
    Unreachable,
}

#[derive(Default)]
struct State {
    objects: HashMap<String, (Bytes, PutOptions)>,
    connects: Vec<Endpoint>,
    calls: Vec<(Endpoint, Op, String)>,
    share_links: Vec<(Endpoint, String, Duration)>,
}

#[derive(Clone)]
pub(crate) struct MemoryConnector {
    bucket: String,
    mode: Mode,
    state: Arc<Mutex<State>>,
}

impl MemoryConnector {
    pub(crate) fn new(bucket: &str) -> Self {
        MemoryConnector {
            bucket: bucket.to_string(),
            mode: Mode::Healthy,
            state: Arc::default(),
        }
    }

    pub(crate) fn failing(bucket: &str) -> Self {
        MemoryConnector {
            mode: Mode::Failing,
            ..Self::new(bucket)
        }
    }

    pub(crate) fn unreachable(bucket: &str) -> Self {
        MemoryConnector {
            mode: Mode::Unreachable,
            ..Self::new(bucket)
        }
    }

    pub(crate) fn connects(&self) -> Vec<Endpoint> {
        self.state.lock().connects.clone()
    }

    pub(crate) fn calls(&self) -> Vec<(Endpoint, Op, String)> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn share_links(&self) -> Vec<(Endpoint, String, Duration)> {
        self.state.lock().share_links.clone()
    }

    pub(crate) fn options_of(&self, key: &str) -> Option<PutOptions> {
        self.state.lock().objects.get(key).map(|(_, options)| options.clone())
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: Endpoint) -> Result<Arc<dyn ObjectClient>, OssError> {
        self.state.lock().connects.push(endpoint);
        if self.mode == Mode::Unreachable {
            return Err(opendal::Error::new(ErrorKind::ConfigInvalid, "endpoint is invalid").into());
        }

        Ok(Arc::new(MemoryClient {
            endpoint,
            bucket: self.bucket.clone(),
            mode: self.mode,
            state: self.state.clone(),
        }))
    }
}

struct MemoryClient {
    endpoint: Endpoint,
    bucket: String,
    mode: Mode,
    state: Arc<Mutex<State>>,
}

impl MemoryClient {
    fn record(&self, op: Op, key: &str) -> Result<(), OssError> {
        self.state.lock().calls.push((self.endpoint, op, key.to_string()));
        if self.mode == Mode::Failing {
            return Err(opendal::Error::new(ErrorKind::Unexpected, "injected failure").into());
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectClient for MemoryClient {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        options: &PutOptions,
    ) -> Result<(), OssError> {
        self.record(Op::Put, key)?;
        self.state
            .lock()
            .objects
            .insert(key.to_string(), (body, options.clone()));
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader, OssError> {
        self.record(Op::Get, key)?;

        let (body, options) = self
            .state
            .lock()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| opendal::Error::new(ErrorKind::NotFound, "NoSuchKey"))?;

        let metadata = ObjectMetadata {
            content_type: Some(options.content_type().to_string()),
            content_length: Some(body.len() as u64),
            content_disposition: options.content_disposition().map(String::from),
            etag: Some("memory".to_string()),
            last_modified: None,
        };

        let chunks: Vec<Result<Bytes, OssError>> = body
            .chunks(CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        Ok(ObjectReader {
            metadata,
            chunks: stream::iter(chunks).boxed(),
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), OssError> {
        self.record(Op::Delete, key)?;
        self.state.lock().objects.remove(key);
        Ok(())
    }

    async fn share_link(&self, key: &str, expires_in: Duration) -> Result<String, OssError> {
        self.state
            .lock()
            .share_links
            .push((self.endpoint, key.to_string(), expires_in));

        // Plain http, so the adapter's https rewrite is observable
        Ok(format!(
            "http://{}.{}/{}?Expires={}&Signature=memory",
            self.bucket,
            self.endpoint.host(AREA),
            key,
            expires_in.as_secs()
        ))
    }
}
