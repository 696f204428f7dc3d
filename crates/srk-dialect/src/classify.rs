//! Error classifier: raw transport outcome → [`ErrorKind`].

use std::fmt;

use serde_json::Value;
use srk_cluster::{CancelToken, ClusterHandle, ClusterRequest, RawResponse, TransportError};
use srk_schemas::{
    Dialect, ErrorKind, Operation, ReconcileError, ResourceIdentity, ResourceKind, WireContext,
};
use tracing::warn;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// A classified failure from one dialect call, before the reconciler attaches
/// the operation and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub wire: WireContext,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, wire: WireContext) -> Self {
        Self {
            kind,
            message: message.into(),
            wire,
        }
    }

    pub fn not_found(message: impl Into<String>, wire: WireContext) -> Self {
        Self::new(ErrorKind::NotFound, message, wire)
    }

    pub fn fatal(message: impl Into<String>, wire: WireContext) -> Self {
        Self::new(ErrorKind::Fatal, message, wire)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message, WireContext::default())
    }

    pub fn from_transport(err: TransportError, wire: WireContext) -> Self {
        let kind = match &err {
            TransportError::Cancelled => ErrorKind::Cancelled,
            TransportError::Connect(_) | TransportError::Timeout(_) => ErrorKind::TransientRemote,
            TransportError::Io(_) => ErrorKind::Fatal,
        };
        Self::new(kind, err.to_string(), wire)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Attach operation, kind, dialect and identity for the host.
    pub fn into_reconcile(
        self,
        operation: Operation,
        resource: ResourceKind,
        dialect: Dialect,
        identity: Option<&ResourceIdentity>,
    ) -> ReconcileError {
        let mut err = ReconcileError::new(self.kind, operation, resource, dialect, self.message)
            .with_wire(self.wire);
        if let Some(id) = identity {
            err = err.with_identity(id);
        }
        err
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if !self.wire.is_empty() {
            write!(f, " ({})", self.wire)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// `None` for 2xx. 404 is absence; throttling and gateway errors are transient;
/// everything else is fatal.
pub fn classify_status(status: u16) -> Option<ErrorKind> {
    match status {
        200..=299 => None,
        404 => Some(ErrorKind::NotFound),
        429 | 502 | 503 | 504 => Some(ErrorKind::TransientRemote),
        _ => Some(ErrorKind::Fatal),
    }
}

fn is_conflict(resp: &RawResponse) -> bool {
    resp.status == 409
        || (resp.status == 400
            && (resp.body.contains("resource_already_exists_exception")
                || resp.body.contains("already exists")))
}

/// Turn a non-2xx response into a classified error carrying the wire context.
pub fn check_status(resp: &RawResponse, wire: &WireContext) -> Result<(), ApiError> {
    let Some(kind) = classify_status(resp.status) else {
        return Ok(());
    };

    let wire = WireContext {
        status: Some(resp.status),
        body: Some(WireContext::excerpt(&resp.body)),
        ..wire.clone()
    };
    let message = match kind {
        ErrorKind::NotFound => "object not found".to_string(),
        ErrorKind::Fatal if is_conflict(resp) => "already exists".to_string(),
        _ => format!("unexpected status {}", resp.status),
    };
    if kind == ErrorKind::TransientRemote {
        warn!(status = resp.status, path = ?wire.path, "transient remote failure");
    }
    Err(ApiError::new(kind, message, wire))
}

// ---------------------------------------------------------------------------
// One round-trip
// ---------------------------------------------------------------------------

/// Perform `req`, classify the outcome, decode the body.
pub(crate) fn send(
    handle: &ClusterHandle,
    req: ClusterRequest,
    cancel: &CancelToken,
) -> Result<Value, ApiError> {
    let wire = WireContext::request(req.method.as_str(), req.path.clone());
    let resp = handle
        .perform(&req, cancel)
        .map_err(|e| ApiError::from_transport(e, wire.clone()))?;
    check_status(&resp, &wire)?;

    resp.json().map_err(|e| {
        ApiError::fatal(
            format!("response decode failed: {e}"),
            WireContext {
                status: Some(resp.status),
                body: Some(WireContext::excerpt(&resp.body)),
                ..wire
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire() -> WireContext {
        WireContext::request("GET", "/_template/t")
    }

    #[test]
    fn status_table() {
        assert_eq!(classify_status(200), None);
        assert_eq!(classify_status(201), None);
        assert_eq!(classify_status(404), Some(ErrorKind::NotFound));
        for s in [429, 502, 503, 504] {
            assert_eq!(classify_status(s), Some(ErrorKind::TransientRemote), "{s}");
        }
        for s in [400, 401, 403, 409, 500] {
            assert_eq!(classify_status(s), Some(ErrorKind::Fatal), "{s}");
        }
    }

    #[test]
    fn non_success_carries_status_and_body_excerpt() {
        let resp = RawResponse::new(500, "x".repeat(2000));
        let err = check_status(&resp, &wire()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal);
        assert_eq!(err.wire.status, Some(500));
        assert_eq!(err.wire.path.as_deref(), Some("/_template/t"));
        assert!(err.wire.body.as_ref().unwrap().len() < 600);
    }

    #[test]
    fn conflicts_read_as_already_exists() {
        let resp = RawResponse::new(
            400,
            r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#,
        );
        let err = check_status(&resp, &wire()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal);
        assert_eq!(err.message, "already exists");
    }

    #[test]
    fn transport_failures_map_to_their_own_kinds() {
        let w = wire();
        assert_eq!(
            ApiError::from_transport(TransportError::Cancelled, w.clone()).kind,
            ErrorKind::Cancelled
        );
        assert_eq!(
            ApiError::from_transport(TransportError::Timeout("t".into()), w.clone()).kind,
            ErrorKind::TransientRemote
        );
        assert_eq!(
            ApiError::from_transport(TransportError::Connect("c".into()), w.clone()).kind,
            ErrorKind::TransientRemote
        );
        assert_eq!(
            ApiError::from_transport(TransportError::Io("i".into()), w).kind,
            ErrorKind::Fatal
        );
    }

    #[test]
    fn into_reconcile_keeps_class_and_wire() {
        let err = ApiError::not_found("object not found", wire()).into_reconcile(
            Operation::Read,
            ResourceKind::IndexTemplate,
            Dialect::V6,
            Some(&ResourceIdentity::named("t")),
        );
        assert!(err.is_not_found());
        assert_eq!(err.identity, Some(ResourceIdentity::named("t")));
        assert_eq!(err.wire.method.as_deref(), Some("GET"));
    }
}
