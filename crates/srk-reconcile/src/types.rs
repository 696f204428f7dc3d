use serde::Serialize;
use serde_json::Value;
use srk_normalize::{FieldDiff, NormalizedDoc};
use srk_schemas::{ReconcileError, ResourceIdentity};

/// Desired state for one object, as the host declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct Desired {
    /// Caller-named kinds: the name (required for create).
    /// Server-assigned kinds: the id from a previous run, if the host has one.
    pub identity: Option<ResourceIdentity>,
    /// Complete desired document. Never a partial delta.
    pub body: Value,
}

impl Desired {
    pub fn new(body: Value) -> Self {
        Self {
            identity: None,
            body,
        }
    }

    pub fn named(identity: ResourceIdentity, body: Value) -> Self {
        Self {
            identity: Some(identity),
            body,
        }
    }
}

/// Successful outcome of a reconciler operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub identity: ResourceIdentity,
    /// Body in desired-document shape (remote body on read, desired on write).
    pub body: Value,
    pub normalized: NormalizedDoc,
}

/// What `plan` decided the host should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "diffs", rename_all = "snake_case")]
pub enum Plan {
    /// Remote is equivalent to desired; issue nothing.
    InSync,
    /// Remote diverges on these paths; issue an Update.
    Update(Vec<FieldDiff>),
    /// No remote object (or no identity yet); issue a Create.
    Create,
}

/// What `converge` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergeAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Converged {
    pub action: ConvergeAction,
    pub reconciled: Reconciled,
}

/// `{identity, normalized, error}` as handed back to the host.
///
/// If `error` is NotFound, `identity` is `None`: the object no longer exists
/// and the host must forget it. Without an error both fields are populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub identity: Option<ResourceIdentity>,
    pub normalized: Option<NormalizedDoc>,
    pub error: Option<ReconcileError>,
}

impl ReconciliationResult {
    /// `prior` is the identity the host held before the call; it survives
    /// any failure other than NotFound.
    pub fn from_outcome(
        prior: Option<&ResourceIdentity>,
        outcome: Result<Reconciled, ReconcileError>,
    ) -> Self {
        match outcome {
            Ok(r) => Self {
                identity: Some(r.identity),
                normalized: Some(r.normalized),
                error: None,
            },
            Err(e) if e.is_not_found() => Self {
                identity: None,
                normalized: None,
                error: Some(e),
            },
            Err(e) => Self {
                identity: prior.cloned(),
                normalized: None,
                error: Some(e),
            },
        }
    }

    pub fn clears_identity(&self) -> bool {
        self.error.as_ref().is_some_and(ReconcileError::is_not_found)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
