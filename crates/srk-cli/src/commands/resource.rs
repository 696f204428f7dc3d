//! Reconciler-backed commands: one operation on one object.

use anyhow::Result;
use serde_json::{json, Value};
use srk_cluster::CancelToken;
use srk_reconcile::{Desired, ReconciliationResult, Reconciler};
use srk_schemas::{ReconcileError, ResourceIdentity, ResourceKind};
use tracing::info;

use super::{connect_from, load_json_file, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Delete,
    Import,
}

fn report(result: ReconciliationResult) -> Result<Outcome> {
    let kind = result.error.as_ref().map(|e| e.kind);
    let json = serde_json::to_value(&result)?;
    Ok(match kind {
        Some(kind) => Outcome::failed(json, kind),
        None => Outcome::ok(json),
    })
}

fn failure(prior: Option<&ResourceIdentity>, err: ReconcileError) -> Result<Outcome> {
    report(ReconciliationResult::from_outcome(prior, Err(err)))
}

pub fn single(
    op: Op,
    config_paths: &[String],
    kind: ResourceKind,
    id: &ResourceIdentity,
) -> Result<Outcome> {
    let handle = connect_from(config_paths)?;
    let reconciler = Reconciler::new(&handle, kind);
    let cancel = CancelToken::new();
    info!(%kind, identity = %id, op = ?op, dialect = %handle.dialect(), "single operation");

    match op {
        Op::Read => report(ReconciliationResult::from_outcome(
            Some(id),
            reconciler.read(id, &cancel),
        )),
        Op::Import => report(ReconciliationResult::from_outcome(
            Some(id),
            reconciler.import(id, &cancel),
        )),
        Op::Delete => match reconciler.delete(id, &cancel) {
            Ok(()) => Ok(Outcome::ok(json!({ "deleted": id, "identity": Value::Null }))),
            Err(e) => failure(Some(id), e),
        },
    }
}

/// Plan, then create or update: the host loop for one object.
pub fn apply(
    config_paths: &[String],
    kind: ResourceKind,
    id: Option<ResourceIdentity>,
    body_path: &str,
) -> Result<Outcome> {
    let body = load_json_file(body_path)?;
    let handle = connect_from(config_paths)?;
    let reconciler = Reconciler::new(&handle, kind);
    let desired = Desired { identity: id, body };

    match reconciler.converge(&desired, &CancelToken::new()) {
        Ok(converged) => Ok(Outcome::ok(json!({
            "action": converged.action,
            "identity": converged.reconciled.identity,
            "normalized": converged.reconciled.normalized,
        }))),
        Err(e) => failure(desired.identity.as_ref(), e),
    }
}
