use serde_json::Value;
use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

#[derive(Debug)]
pub struct LifecyclePolicyProfile;

impl KindProfile for LifecyclePolicyProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::LifecyclePolicy
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .strip_all(&["version", "modified_date", "modified_date_string", "in_use_by"])
            .default_value("policy.phases.*.min_age", "0ms")
    }

    /// Only `policy` is writable; the read envelope adds bookkeeping beside it.
    fn read_body(&self, remote: Value, _dialect: Dialect) -> Value {
        match remote {
            Value::Object(mut m) => match m.remove("policy") {
                Some(policy) => serde_json::json!({ "policy": policy }),
                None => Value::Object(m),
            },
            other => other,
        }
    }
}
