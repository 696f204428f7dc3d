//! srk-testkit
//!
//! In-memory cluster emulation for end-to-end reconciler scenarios.
//!
//! [`FakeCluster`] implements the cluster transport and answers the way a
//! live cluster of each dialect answers: server-injected fields, stringified
//! settings, dialect-specific routes, alerting search. Scenarios live under
//! `tests/` and drive the real reconcilers through it.
//!
//! It does **not**:
//! - speak HTTP (the HTTP transport has its own mock-server tests)
//! - model mappings, shards, or search beyond `term`/`exists` filters

mod fake_cluster;
mod render;

use serde_json::{json, Value};
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind};

pub use fake_cluster::FakeCluster;

/// A representative desired body for `kind`, valid on every dialect that
/// supports the kind.
pub fn sample_body(kind: ResourceKind) -> Value {
    match kind {
        ResourceKind::Index => json!({
            "settings": {"number_of_replicas": 1, "refresh_interval": "5s"}
        }),
        ResourceKind::IndexTemplate => json!({
            "index_patterns": ["logs-*"],
            "settings": {"number_of_shards": 1}
        }),
        ResourceKind::LifecyclePolicy => json!({"policy": {"phases": {
            "hot": {"actions": {"rollover": {"max_size": "50gb"}}},
            "delete": {"min_age": "30d", "actions": {"delete": {}}}
        }}}),
        ResourceKind::IngestPipeline => json!({
            "description": "tag source",
            "processors": [
                {"set": {"field": "source", "value": "fluentd"}},
                {"lowercase": {"field": "level"}}
            ]
        }),
        ResourceKind::SnapshotRepository => json!({
            "type": "fs",
            "settings": {"location": "/backups", "compress": true}
        }),
        ResourceKind::SecurityRole => json!({
            "cluster": ["monitor"],
            "indices": [{"names": ["logs-*"], "privileges": ["read", "view_index_metadata"]}]
        }),
        ResourceKind::SecurityRoleMapping => json!({
            "roles": ["viewer"],
            "rules": {"field": {"username": "*"}}
        }),
        ResourceKind::SecurityUser => json!({
            "password": "changeme123",
            "roles": ["viewer"],
            "full_name": "Ops Viewer"
        }),
        ResourceKind::SavedObject => json!({
            "type": "index-pattern",
            "index-pattern": {"title": "logs-*", "timeFieldName": "@timestamp"}
        }),
        ResourceKind::AlertingDestination => json!({
            "name": "ops",
            "type": "slack",
            "slack": {"url": "https://hooks.example.com/services/ops"}
        }),
        ResourceKind::AlertingMonitor => json!({
            "type": "monitor",
            "name": "error-rate",
            "enabled": true,
            "schedule": {"period": {"interval": 5, "unit": "MINUTES"}},
            "inputs": [{"search": {"indices": ["logs-*"], "query": {"size": 0}}}],
            "triggers": [{
                "name": "too-many",
                "severity": "1",
                "condition": {"script": {"source": "ctx.results[0].hits.total > 10", "lang": "painless"}},
                "actions": [{"name": "notify", "destination_id": "ops"}]
            }]
        }),
        ResourceKind::AlertingWatch => json!({
            "trigger": {"schedule": {"interval": "10m"}},
            "input": {"simple": {"level": "error"}},
            "actions": {"log": {"logging": {"text": "errors seen"}}}
        }),
    }
}

/// The identity scenarios create caller-named kinds under. V5 saved objects
/// carry their mapping type in the identity.
pub fn sample_identity(kind: ResourceKind, dialect: Dialect) -> Option<ResourceIdentity> {
    match kind {
        ResourceKind::AlertingDestination | ResourceKind::AlertingMonitor => None,
        ResourceKind::SavedObject if dialect == Dialect::V5 => {
            Some(ResourceIdentity::typed(".kibana", "index-pattern", "logs"))
        }
        ResourceKind::SavedObject => Some(ResourceIdentity::named("index-pattern:logs")),
        ResourceKind::Index => Some(ResourceIdentity::named("logs-2024")),
        _ => Some(ResourceIdentity::named("sample")),
    }
}
