use serde_json::Value;
use srk_cluster::{CancelToken, ClusterHandle};
use srk_dialect::{select, ApiError, ResourceApi};
use srk_normalize::{compare, normalize, DiffVerdict, NormalizeProfile};
use srk_schemas::{
    Dialect, ErrorKind, IdentitySource, Operation, ReconcileError, ResourceIdentity, ResourceKind,
    WireContext,
};
use tracing::{info, warn};

use crate::kinds::{profile_for, KindProfile};
use crate::types::{ConvergeAction, Converged, Desired, Plan, Reconciled};

/// Create/Read/Update/Delete/Import plus diff suppression for one kind on
/// one cluster.
///
/// The dialect implementation is selected once, here. An unsupported kind
/// still yields a reconciler; each operation then fails with
/// `ErrorKind::Unsupported` without touching the network.
#[derive(Debug)]
pub struct Reconciler {
    kind: ResourceKind,
    dialect: Dialect,
    api: Result<Box<dyn ResourceApi>, ApiError>,
    profile: Box<dyn KindProfile>,
    normalize: NormalizeProfile,
}

impl Reconciler {
    pub fn new(handle: &ClusterHandle, kind: ResourceKind) -> Self {
        let api = select(handle, kind);
        let dialect = match &api {
            Ok(api) => api.dialect(),
            Err(_) => handle.dialect(),
        };
        let profile = profile_for(kind);
        let normalize = profile.normalize_profile(dialect);
        Self {
            kind,
            dialect,
            api,
            profile,
            normalize,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_supported(&self) -> bool {
        self.api.is_ok()
    }

    // -----------------------------------------------------------------------
    // Error plumbing
    // -----------------------------------------------------------------------

    fn fail(&self, op: Operation, id: Option<&ResourceIdentity>, e: ApiError) -> ReconcileError {
        let err = e.into_reconcile(op, self.kind, self.dialect, id);
        match err.kind {
            ErrorKind::NotFound | ErrorKind::Cancelled => {
                info!(kind = %self.kind, op = %op, class = %err.kind, "operation ended without change")
            }
            _ => warn!(error = %err, "operation failed"),
        }
        err
    }

    fn fatal(&self, op: Operation, id: Option<&ResourceIdentity>, msg: String) -> ReconcileError {
        self.fail(op, id, ApiError::fatal(msg, WireContext::default()))
    }

    fn api(&self, op: Operation, id: Option<&ResourceIdentity>) -> Result<&dyn ResourceApi, ReconcileError> {
        match &self.api {
            Ok(api) => Ok(api.as_ref()),
            Err(e) => Err(e.clone().into_reconcile(op, self.kind, self.dialect, id)),
        }
    }

    fn reconciled(&self, identity: ResourceIdentity, body: Value) -> Reconciled {
        let normalized = normalize(&body, &self.normalize);
        Reconciled {
            identity,
            body,
            normalized,
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// `Absent → Present`. Refuses with Fatal "already exists" when the object
    /// is already there and the create call would not notice on its own.
    pub fn create(&self, desired: &Desired, cancel: &CancelToken) -> Result<Reconciled, ReconcileError> {
        self.create_guarded(desired, cancel, false)
    }

    /// `absent_proven`: a read in this same call already saw NotFound for
    /// `desired.identity`, so it is not read again.
    fn create_guarded(
        &self,
        desired: &Desired,
        cancel: &CancelToken,
        absent_proven: bool,
    ) -> Result<Reconciled, ReconcileError> {
        let op = Operation::Create;
        let hint = desired.identity.as_ref();
        let api = self.api(op, hint)?;
        let body = self
            .profile
            .write_body(&desired.body, self.dialect)
            .map_err(|m| self.fatal(op, hint, m))?;

        let identity = match self.kind.identity_source() {
            IdentitySource::CallerNamed => {
                let Some(target) = hint else {
                    return Err(self.fatal(op, None, format!("{} create needs a name", self.kind)));
                };
                let id = api
                    .canonical_identity(target)
                    .map_err(|e| self.fail(op, Some(target), e))?;
                if !api.native_create_dedup() && !absent_proven {
                    self.ensure_absent(api, &id, cancel)?;
                }
                api.create(Some(&id), &body, cancel)
                    .map_err(|e| self.fail(op, Some(&id), e))?
            }
            IdentitySource::ServerAssigned => {
                match hint {
                    Some(known) if !absent_proven => self.ensure_absent(api, known, cancel)?,
                    _ => {}
                }
                if api.can_locate_by_name() {
                    if let Some(name) = self.profile.object_name(&desired.body) {
                        let found = api
                            .locate_by_name(&name, cancel)
                            .map_err(|e| self.fail(op, None, e))?;
                        if let Some(existing) = found {
                            return Err(self.fatal(
                                op,
                                Some(&existing),
                                format!("already exists (name '{name}')"),
                            ));
                        }
                    }
                }
                api.create(None, &body, cancel)
                    .map_err(|e| self.fail(op, None, e))?
            }
        };

        info!(kind = %self.kind, identity = %identity, dialect = %self.dialect, "created");
        Ok(self.reconciled(identity, self.profile.desired_shape(&desired.body, self.dialect)))
    }

    fn ensure_absent(
        &self,
        api: &dyn ResourceApi,
        id: &ResourceIdentity,
        cancel: &CancelToken,
    ) -> Result<(), ReconcileError> {
        match api.read(id, cancel) {
            Ok(_) => Err(self.fatal(Operation::Create, Some(id), "already exists".to_string())),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(self.fail(Operation::Create, Some(id), e)),
        }
    }

    pub fn read(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Reconciled, ReconcileError> {
        self.read_as(Operation::Read, id, cancel)
    }

    fn read_as(
        &self,
        op: Operation,
        id: &ResourceIdentity,
        cancel: &CancelToken,
    ) -> Result<Reconciled, ReconcileError> {
        let api = self.api(op, Some(id))?;
        let id = api
            .canonical_identity(id)
            .map_err(|e| self.fail(op, Some(id), e))?;
        let remote = api.read(&id, cancel).map_err(|e| self.fail(op, Some(&id), e))?;
        let body = self.profile.read_body(remote, self.dialect);
        Ok(self.reconciled(id, body))
    }

    /// Full-document replace with the complete desired body.
    pub fn update(
        &self,
        id: &ResourceIdentity,
        desired: &Value,
        cancel: &CancelToken,
    ) -> Result<Reconciled, ReconcileError> {
        let op = Operation::Update;
        let api = self.api(op, Some(id))?;
        let id = api
            .canonical_identity(id)
            .map_err(|e| self.fail(op, Some(id), e))?;

        let current = if self.profile.update_reads_current() {
            let remote = api.read(&id, cancel).map_err(|e| self.fail(op, Some(&id), e))?;
            self.profile.read_body(remote, self.dialect)
        } else {
            Value::Null
        };

        let body = self
            .profile
            .update_body(desired, &current, self.dialect)
            .map_err(|m| self.fatal(op, Some(&id), m))?;

        match body {
            Some(body) => {
                api.update(&id, &body, cancel)
                    .map_err(|e| self.fail(op, Some(&id), e))?;
                info!(kind = %self.kind, identity = %id, dialect = %self.dialect, "updated");
            }
            None => info!(kind = %self.kind, identity = %id, "update had nothing to send"),
        }
        Ok(self.reconciled(id, self.profile.desired_shape(desired, self.dialect)))
    }

    /// Deleting an absent object is NotFound, never Fatal.
    pub fn delete(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<(), ReconcileError> {
        let op = Operation::Delete;
        let api = self.api(op, Some(id))?;
        let id = api
            .canonical_identity(id)
            .map_err(|e| self.fail(op, Some(id), e))?;
        api.delete(&id, cancel).map_err(|e| self.fail(op, Some(&id), e))?;
        info!(kind = %self.kind, identity = %id, dialect = %self.dialect, "deleted");
        Ok(())
    }

    /// `Absent → Present` without Create: trust the identity, hydrate by Read.
    pub fn import(&self, id: &ResourceIdentity, cancel: &CancelToken) -> Result<Reconciled, ReconcileError> {
        let r = self.read_as(Operation::Import, id, cancel)?;
        info!(kind = %self.kind, identity = %r.identity, dialect = %self.dialect, "imported");
        Ok(r)
    }

    // -----------------------------------------------------------------------
    // Diff suppression
    // -----------------------------------------------------------------------

    /// Pure comparison of a desired body against a read-shaped remote body.
    pub fn diff(&self, desired: &Value, remote: &Value) -> DiffVerdict {
        let desired = self.profile.desired_shape(desired, self.dialect);
        compare(&desired, remote, &self.normalize)
    }

    /// Read and diff in one call, so the host issues Update only on divergence.
    pub fn plan(
        &self,
        id: Option<&ResourceIdentity>,
        desired: &Value,
        cancel: &CancelToken,
    ) -> Result<Plan, ReconcileError> {
        self.assess(id, desired, cancel).map(|(plan, _)| plan)
    }

    /// The plan plus the remote state it was computed from, when there is one.
    fn assess(
        &self,
        id: Option<&ResourceIdentity>,
        desired: &Value,
        cancel: &CancelToken,
    ) -> Result<(Plan, Option<Reconciled>), ReconcileError> {
        let Some(id) = id else {
            self.api(Operation::Plan, None)?;
            return Ok((Plan::Create, None));
        };
        match self.read_as(Operation::Plan, id, cancel) {
            Ok(remote) => {
                let plan = match self.diff(desired, &remote.body) {
                    DiffVerdict::Equivalent => Plan::InSync,
                    DiffVerdict::Diverged(diffs) => Plan::Update(diffs),
                };
                Ok((plan, Some(remote)))
            }
            Err(e) if e.is_not_found() => Ok((Plan::Create, None)),
            Err(e) => Err(e),
        }
    }

    /// Plan, then create or update as needed. One host-loop step for one object.
    pub fn converge(&self, desired: &Desired, cancel: &CancelToken) -> Result<Converged, ReconcileError> {
        let named = self.kind.identity_source() == IdentitySource::CallerNamed;
        if named && desired.identity.is_none() {
            return Err(self.fatal(Operation::Plan, None, format!("{} needs a name", self.kind)));
        }

        match self.assess(desired.identity.as_ref(), &desired.body, cancel)? {
            (Plan::InSync, Some(remote)) => Ok(Converged {
                action: ConvergeAction::Unchanged,
                reconciled: remote,
            }),
            (Plan::Update(diffs), Some(remote)) => {
                info!(kind = %self.kind, identity = %remote.identity, diffs = diffs.len(), "diverged");
                Ok(Converged {
                    action: ConvergeAction::Updated,
                    reconciled: self.update(&remote.identity, &desired.body, cancel)?,
                })
            }
            _ => Ok(Converged {
                action: ConvergeAction::Created,
                reconciled: self.create_guarded(desired, cancel, true)?,
            }),
        }
    }
}
