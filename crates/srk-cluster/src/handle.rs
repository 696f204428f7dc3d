use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use srk_schemas::Dialect;
use tracing::debug;

use crate::transport::{CancelToken, ClusterRequest, Method, RawResponse, Transport, TransportError};

/// Dialect-tagged connection to one cluster.
///
/// Cheap to clone: clones share the transport. Never mutated after construction.
#[derive(Clone)]
pub struct ClusterHandle {
    dialect: Dialect,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterHandle")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl ClusterHandle {
    pub fn new(dialect: Dialect, transport: Arc<dyn Transport>) -> Self {
        Self { dialect, transport }
    }

    pub fn v5(transport: Arc<dyn Transport>) -> Self {
        Self::new(Dialect::V5, transport)
    }

    pub fn v6(transport: Arc<dyn Transport>) -> Self {
        Self::new(Dialect::V6, transport)
    }

    pub fn v7(transport: Arc<dyn Transport>) -> Self {
        Self::new(Dialect::V7, transport)
    }

    /// The capability tag. Read once by the dialect selector.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn perform(
        &self,
        req: &ClusterRequest,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        debug!(method = %req.method, path = %req.path, dialect = %self.dialect, "cluster request");
        let resp = self.transport.perform(req, cancel)?;
        debug!(method = %req.method, path = %req.path, status = resp.status, "cluster response");
        Ok(resp)
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    pub fn get(&self, path: &str, cancel: &CancelToken) -> Result<RawResponse, TransportError> {
        self.perform(&ClusterRequest::new(Method::Get, path), cancel)
    }

    pub fn put_json(
        &self,
        path: &str,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        self.perform(
            &ClusterRequest::new(Method::Put, path).with_body(body.clone()),
            cancel,
        )
    }

    pub fn post_json(
        &self,
        path: &str,
        body: &Value,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        self.perform(
            &ClusterRequest::new(Method::Post, path).with_body(body.clone()),
            cancel,
        )
    }

    pub fn delete(&self, path: &str, cancel: &CancelToken) -> Result<RawResponse, TransportError> {
        self.perform(&ClusterRequest::new(Method::Delete, path), cancel)
    }

    /// `POST /{index}/_search` with the given query document.
    pub fn search(
        &self,
        index: &str,
        query: &Value,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        self.post_json(&format!("/{index}/_search"), query, cancel)
    }
}
