use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Dialect, ResourceIdentity, ResourceKind};

/// Response bodies carried in errors are cut to this many bytes.
pub const BODY_EXCERPT_LIMIT: usize = 512;

/// Classified outcome of a failed operation.
///
/// The host branches on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The object does not exist. The host clears the identity; not a run failure.
    NotFound,
    /// The kind or operation has no implementation on the handle's dialect.
    /// Non-retryable; the host may skip and warn instead of aborting.
    Unsupported,
    /// Throttling, gateway errors, connect/timeout failures. Not retried here.
    TransientRemote,
    /// The caller's cancellation token fired. The operation was abandoned, not failed.
    Cancelled,
    /// Everything else: unexpected status, decode errors, ambiguous matches,
    /// create conflicts.
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::TransientRemote => "transient_remote",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Fatal => "fatal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientRemote)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciler operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Plan,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
            Operation::Plan => "plan",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The request a failure was observed on, when there was one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireContext {
    pub method: Option<String>,
    pub path: Option<String>,
    pub status: Option<u16>,
    /// Response body excerpt, at most [`BODY_EXCERPT_LIMIT`] bytes.
    pub body: Option<String>,
}

impl WireContext {
    pub fn request(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            path: Some(path.into()),
            status: None,
            body: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.path.is_none() && self.status.is_none()
    }

    /// Cut `body` to [`BODY_EXCERPT_LIMIT`] bytes on a char boundary.
    pub fn excerpt(body: &str) -> String {
        if body.len() <= BODY_EXCERPT_LIMIT {
            return body.to_string();
        }
        let mut end = BODY_EXCERPT_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}

impl fmt::Display for WireContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        match (&self.method, &self.path) {
            (Some(m), Some(p)) => parts.push(format!("{m} {p}")),
            (None, Some(p)) => parts.push(p.clone()),
            (Some(m), None) => parts.push(m.clone()),
            (None, None) => {}
        }
        if let Some(s) = self.status {
            parts.push(format!("status={s}"));
        }
        if let Some(b) = &self.body {
            parts.push(format!("body={b}"));
        }
        f.write_str(&parts.join(" "))
    }
}

/// A classified failure with enough context for the host to report which
/// declarative object could not be converged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileError {
    pub kind: ErrorKind,
    pub operation: Operation,
    pub resource: ResourceKind,
    pub dialect: Dialect,
    pub identity: Option<ResourceIdentity>,
    pub message: String,
    pub wire: WireContext,
}

impl ReconcileError {
    pub fn new(
        kind: ErrorKind,
        operation: Operation,
        resource: ResourceKind,
        dialect: Dialect,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation,
            resource,
            dialect,
            identity: None,
            message: message.into(),
            wire: WireContext::default(),
        }
    }

    pub fn with_identity(mut self, identity: &ResourceIdentity) -> Self {
        self.identity = Some(identity.clone());
        self
    }

    pub fn with_wire(mut self, wire: WireContext) -> Self {
        self.wire = wire;
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind == ErrorKind::Unsupported
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.resource)?;
        if let Some(id) = &self.identity {
            write!(f, " '{id}'")?;
        }
        write!(
            f,
            " failed [{}] on {}: {}",
            self.kind, self.dialect, self.message
        )?;
        if !self.wire.is_empty() {
            write!(f, " ({})", self.wire)?;
        }
        Ok(())
    }
}

impl std::error::Error for ReconcileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_operation_kind_identity_and_class() {
        let err = ReconcileError::new(
            ErrorKind::Fatal,
            Operation::Create,
            ResourceKind::LifecyclePolicy,
            Dialect::V7,
            "already exists",
        )
        .with_identity(&ResourceIdentity::named("policy-a"))
        .with_wire(WireContext {
            method: Some("GET".to_string()),
            path: Some("/_ilm/policy/policy-a".to_string()),
            status: Some(200),
            body: None,
        });

        assert_eq!(
            err.to_string(),
            "create lifecycle-policy 'policy-a' failed [fatal] on v7: already exists \
             (GET /_ilm/policy/policy-a status=200)"
        );
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(BODY_EXCERPT_LIMIT);
        let cut = WireContext::excerpt(&long);
        assert!(cut.len() <= BODY_EXCERPT_LIMIT + '…'.len_utf8());
        assert!(cut.ends_with('…'));
        assert_eq!(WireContext::excerpt("short"), "short");
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(ErrorKind::TransientRemote.is_retryable());
        assert!(!ErrorKind::Fatal.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
        assert!(!ErrorKind::Unsupported.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
    }
}
