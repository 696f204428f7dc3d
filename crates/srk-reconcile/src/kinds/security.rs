use serde_json::Value;
use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::{expand_json_string, KindProfile};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// `field_security` and `query` may arrive as serialized JSON strings; the
/// canonical form is the structured value.
#[derive(Debug)]
pub struct RoleProfile;

impl KindProfile for RoleProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SecurityRole
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .strip("transient_metadata")
            .embedded_json("indices.*.query")
            .embedded_json("indices.*.field_security")
    }

    fn write_body(&self, desired: &Value, _dialect: Dialect) -> Result<Value, String> {
        let mut body = desired.clone();
        if let Some(indices) = body.get_mut("indices").and_then(Value::as_array_mut) {
            for entry in indices {
                if let Some(fs) = entry.get_mut("field_security") {
                    expand_json_string(fs);
                }
            }
        }
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Role mapping
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RoleMappingProfile;

impl KindProfile for RoleMappingProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SecurityRoleMapping
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .embedded_json("rules")
            .default_value("enabled", "true")
    }

    /// The API only takes `rules` as an object.
    fn write_body(&self, desired: &Value, _dialect: Dialect) -> Result<Value, String> {
        let mut body = desired.clone();
        if let Some(rules) = body.get_mut("rules") {
            expand_json_string(rules);
        }
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// `password` is write-only: sent on create and update, never read back.
#[derive(Debug)]
pub struct UserProfile;

impl KindProfile for UserProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SecurityUser
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .strip_all(&["password", "password_hash", "username"])
            .default_value("enabled", "true")
    }
}
