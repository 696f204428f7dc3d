use serde_json::Value;
use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

fn name_field(desired: &Value) -> Option<String> {
    desired
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DestinationProfile;

impl KindProfile for DestinationProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AlertingDestination
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new().strip_all(&[
            "id",
            "schema_version",
            "last_update_time",
            "seq_no",
            "primary_term",
            "user",
        ])
    }

    fn object_name(&self, desired: &Value) -> Option<String> {
        name_field(desired)
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MonitorProfile;

impl KindProfile for MonitorProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AlertingMonitor
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .strip_all(&[
                "schema_version",
                "last_update_time",
                "enabled_time",
                "user",
                "triggers.*.id",
                "triggers.*.actions.*.id",
            ])
            .default_value("type", "monitor")
    }

    fn object_name(&self, desired: &Value) -> Option<String> {
        name_field(desired)
    }
}

// ---------------------------------------------------------------------------
// Watch
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct WatchProfile;

impl KindProfile for WatchProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AlertingWatch
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new().strip("status")
    }
}
