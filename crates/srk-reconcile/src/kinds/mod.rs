//! Per-kind body shaping and diff-suppression rules.
//!
//! A profile never performs I/O and never picks a request; it only adapts
//! bodies. The dialect it receives comes from the selected `ResourceApi`.

use std::fmt;

use serde_json::Value;
use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

mod alerting;
mod index;
mod index_template;
mod lifecycle_policy;
mod ingest_pipeline;
mod saved_object;
mod security;
mod snapshot_repository;

pub use index::STATIC_INDEX_SETTINGS;

pub trait KindProfile: Send + Sync + fmt::Debug {
    fn kind(&self) -> ResourceKind;

    /// Diff-suppression rules for bodies of this kind on `dialect`.
    fn normalize_profile(&self, dialect: Dialect) -> NormalizeProfile;

    /// Shape a desired body into what the dialect's write endpoint accepts.
    fn write_body(&self, desired: &Value, _dialect: Dialect) -> Result<Value, String> {
        Ok(desired.clone())
    }

    /// Shape a read body into desired-document form.
    fn read_body(&self, remote: Value, _dialect: Dialect) -> Value {
        remote
    }

    /// The desired body in the canonical form reads come back in, so
    /// alternative spellings the write path accepts compare equal.
    fn desired_shape(&self, desired: &Value, _dialect: Dialect) -> Value {
        desired.clone()
    }

    /// Name used to find an existing server-assigned object.
    fn object_name(&self, _desired: &Value) -> Option<String> {
        None
    }

    /// `true` when update needs the current remote body to build its request.
    fn update_reads_current(&self) -> bool {
        false
    }

    /// Body for an update. `current` is the read-shaped remote body when
    /// [`KindProfile::update_reads_current`] is set, otherwise `Null`.
    /// `None`: nothing to send.
    fn update_body(
        &self,
        desired: &Value,
        _current: &Value,
        dialect: Dialect,
    ) -> Result<Option<Value>, String> {
        self.write_body(desired, dialect).map(Some)
    }
}

pub fn profile_for(kind: ResourceKind) -> Box<dyn KindProfile> {
    match kind {
        ResourceKind::Index => Box::new(index::IndexProfile),
        ResourceKind::IndexTemplate => Box::new(index_template::IndexTemplateProfile),
        ResourceKind::LifecyclePolicy => Box::new(lifecycle_policy::LifecyclePolicyProfile),
        ResourceKind::IngestPipeline => Box::new(ingest_pipeline::IngestPipelineProfile),
        ResourceKind::SnapshotRepository => {
            Box::new(snapshot_repository::SnapshotRepositoryProfile)
        }
        ResourceKind::SecurityRole => Box::new(security::RoleProfile),
        ResourceKind::SecurityRoleMapping => Box::new(security::RoleMappingProfile),
        ResourceKind::SecurityUser => Box::new(security::UserProfile),
        ResourceKind::SavedObject => Box::new(saved_object::SavedObjectProfile),
        ResourceKind::AlertingDestination => Box::new(alerting::DestinationProfile),
        ResourceKind::AlertingMonitor => Box::new(alerting::MonitorProfile),
        ResourceKind::AlertingWatch => Box::new(alerting::WatchProfile),
    }
}

/// Replace a string field holding a serialized JSON object/array with the
/// parsed structure. Any other value is left as is.
pub(crate) fn expand_json_string(v: &mut Value) {
    if let Value::String(s) = v {
        if let Ok(parsed @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(s)
        {
            *v = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_has_a_profile() {
        for k in ResourceKind::ALL {
            assert_eq!(profile_for(k).kind(), k);
        }
    }

    #[test]
    fn expand_json_string_only_touches_structures() {
        let mut a = json!("{\"x\":1}");
        expand_json_string(&mut a);
        assert_eq!(a, json!({"x": 1}));

        let mut b = json!("42");
        expand_json_string(&mut b);
        assert_eq!(b, json!("42"));

        let mut c = json!({"already": true});
        expand_json_string(&mut c);
        assert_eq!(c, json!({"already": true}));
    }
}
