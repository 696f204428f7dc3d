//! Offline diff: no cluster, just the kind's normalization rules.

use anyhow::Result;
use serde_json::json;
use srk_dialect::supports;
use srk_normalize::compare;
use srk_reconcile::profile_for;
use srk_schemas::{Dialect, ErrorKind, ResourceKind};

use super::{load_json_file, Outcome};

/// `remote` is a body as the cluster returns it; it is shaped to desired
/// form the same way a Read would before comparing. `desired` gets the same
/// canonical shaping the reconciler applies.
pub fn offline(
    kind: ResourceKind,
    dialect: Dialect,
    desired_path: &str,
    remote_path: &str,
) -> Result<Outcome> {
    if !supports(dialect, kind) {
        return Ok(Outcome::failed(
            json!({"error": format!("{kind} is not available on dialect {dialect}")}),
            ErrorKind::Unsupported,
        ));
    }

    let desired = load_json_file(desired_path)?;
    let remote = load_json_file(remote_path)?;
    let profile = profile_for(kind);
    let desired = profile.desired_shape(&desired, dialect);
    let remote = profile.read_body(remote, dialect);
    let verdict = compare(&desired, &remote, &profile.normalize_profile(dialect));

    Ok(Outcome::ok(json!({
        "kind": kind,
        "dialect": dialect,
        "verdict": verdict,
    })))
}
