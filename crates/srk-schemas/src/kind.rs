use std::fmt;

use serde::{Deserialize, Serialize};

/// Every kind of cluster object a reconciler can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Index,
    IndexTemplate,
    LifecyclePolicy,
    IngestPipeline,
    SnapshotRepository,
    SecurityRole,
    SecurityRoleMapping,
    SecurityUser,
    SavedObject,
    AlertingDestination,
    AlertingMonitor,
    AlertingWatch,
}

/// Who picks the identity of a new object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// The caller names the object; the name is interpolated into the request path.
    CallerNamed,
    /// The cluster assigns an id in the response to a collection POST.
    ServerAssigned,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::Index,
        ResourceKind::IndexTemplate,
        ResourceKind::LifecyclePolicy,
        ResourceKind::IngestPipeline,
        ResourceKind::SnapshotRepository,
        ResourceKind::SecurityRole,
        ResourceKind::SecurityRoleMapping,
        ResourceKind::SecurityUser,
        ResourceKind::SavedObject,
        ResourceKind::AlertingDestination,
        ResourceKind::AlertingMonitor,
        ResourceKind::AlertingWatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Index => "index",
            ResourceKind::IndexTemplate => "index-template",
            ResourceKind::LifecyclePolicy => "lifecycle-policy",
            ResourceKind::IngestPipeline => "ingest-pipeline",
            ResourceKind::SnapshotRepository => "snapshot-repository",
            ResourceKind::SecurityRole => "security-role",
            ResourceKind::SecurityRoleMapping => "security-role-mapping",
            ResourceKind::SecurityUser => "security-user",
            ResourceKind::SavedObject => "saved-object",
            ResourceKind::AlertingDestination => "alerting-destination",
            ResourceKind::AlertingMonitor => "alerting-monitor",
            ResourceKind::AlertingWatch => "alerting-watch",
        }
    }

    pub fn parse(s: &str) -> Result<Self, KindParseError> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| KindParseError(s.to_string()))
    }

    pub fn identity_source(&self) -> IdentitySource {
        match self {
            ResourceKind::AlertingDestination | ResourceKind::AlertingMonitor => {
                IdentitySource::ServerAssigned
            }
            _ => IdentitySource::CallerNamed,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindParseError(pub String);

impl fmt::Display for KindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
        write!(
            f,
            "unknown resource kind '{}'. expected one of: {}",
            self.0,
            known.join(" | ")
        )
    }
}

impl std::error::Error for KindParseError {}
