use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One management API call. `path` includes any query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ClusterRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Whatever the cluster answered, any status. Classification happens upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON. An empty body decodes to `null`.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Caller-owned cancellation flag, passed unchanged down to the transport.
///
/// The transport checks it before a request leaves; a request already on the
/// wire runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Failures below HTTP: the request got no status line at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// TCP/TLS connection could not be established.
    Connect(String),
    /// The request or response exceeded the configured timeout.
    Timeout(String),
    /// Any other IO or protocol failure.
    Io(String),
    /// The caller's [`CancelToken`] fired before the request was sent.
    Cancelled,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connect error: {msg}"),
            TransportError::Timeout(msg) => write!(f, "timeout: {msg}"),
            TransportError::Io(msg) => write!(f, "transport error: {msg}"),
            TransportError::Cancelled => write!(f, "cancelled by caller"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Synchronous request executor behind a [`crate::ClusterHandle`].
///
/// Implementations must be object-safe and `Send + Sync`; the host may run
/// reconcilers for independent objects on several threads over one handle.
pub trait Transport: Send + Sync {
    fn perform(
        &self,
        req: &ClusterRequest,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError>;
}
