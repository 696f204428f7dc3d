use serde_json::{json, Map, Value};
use srk_normalize::{normalize, NormalizeProfile};
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

/// Index settings fixed at creation. Changing one needs a new index.
pub const STATIC_INDEX_SETTINGS: &[&str] = &[
    "index.number_of_shards",
    "index.codec",
    "index.routing_partition_size",
    "index.number_of_routing_shards",
];

/// Needs a closed index; treated as static here.
const ANALYSIS_PREFIX: &str = "index.analysis.";

const SERVER_INJECTED: &[&str] = &[
    "settings.index.creation_date",
    "settings.index.uuid",
    "settings.index.version",
    "settings.index.provided_name",
    "settings.index.routing.allocation.include._tier_preference",
];

#[derive(Debug)]
pub struct IndexProfile;

impl IndexProfile {
    fn default_shards(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::V5 | Dialect::V6 => "5",
            Dialect::V7 => "1",
        }
    }
}

fn settings_only(body: &Value) -> Value {
    json!({ "settings": body.get("settings").cloned().unwrap_or(Value::Null) })
}

impl KindProfile for IndexProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Index
    }

    fn normalize_profile(&self, dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .settings("settings", "index.")
            .strip_all(SERVER_INJECTED)
            .default_value("settings.index.number_of_shards", Self::default_shards(dialect))
            .default_value("settings.index.number_of_replicas", "1")
    }

    fn update_reads_current(&self) -> bool {
        true
    }

    /// The settings endpoint patches: send only desired settings whose value
    /// differs from the current one. Mappings and aliases are not updated.
    fn update_body(
        &self,
        desired: &Value,
        current: &Value,
        _dialect: Dialect,
    ) -> Result<Option<Value>, String> {
        let flat = NormalizeProfile::new().settings("settings", "index.");
        let want = normalize(&settings_only(desired), &flat);
        let have = normalize(&settings_only(current), &flat);

        let mut patch = Map::new();
        for (path, value) in want.fields() {
            if have.get(path) == Some(value.as_str()) {
                continue;
            }
            let key = path.strip_prefix("settings.").unwrap_or(path);
            if STATIC_INDEX_SETTINGS.contains(&key) || key.starts_with(ANALYSIS_PREFIX) {
                return Err(format!(
                    "static setting '{key}' cannot change on an existing index ({} -> {value})",
                    have.get(path).unwrap_or("<unset>")
                ));
            }
            patch.insert(key.to_string(), Value::String(value.clone()));
        }

        if patch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Value::Object(patch)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srk_normalize::compare;

    #[test]
    fn server_injected_settings_and_defaults_are_ignored() {
        let desired = json!({"settings": {"refresh_interval": "5s"}});
        let remote = json!({
            "aliases": {},
            "mappings": {},
            "settings": {"index": {
                "creation_date": "1600000000000",
                "uuid": "Zx1",
                "version": {"created": "7100099"},
                "provided_name": "logs",
                "number_of_shards": "1",
                "number_of_replicas": "1",
                "refresh_interval": "5s"
            }}
        });
        let p = IndexProfile.normalize_profile(Dialect::V7);
        assert!(compare(&desired, &remote, &p).is_equivalent());

        // Five shards is only the default before V7.
        let v5 = IndexProfile.normalize_profile(Dialect::V5);
        assert!(!compare(&desired, &remote, &v5).is_equivalent());
    }

    #[test]
    fn update_sends_only_changed_dynamic_settings() {
        let desired = json!({"settings": {"number_of_replicas": 2, "refresh_interval": "5s"}});
        let current = json!({"settings": {"index": {
            "number_of_replicas": "1",
            "refresh_interval": "5s",
            "number_of_shards": "3"
        }}});

        let body = IndexProfile
            .update_body(&desired, &current, Dialect::V7)
            .unwrap()
            .unwrap();
        assert_eq!(body, json!({"index.number_of_replicas": "2"}));
    }

    #[test]
    fn no_change_means_no_request() {
        let desired = json!({"settings": {"index": {"number_of_replicas": "1"}}});
        let current = json!({"settings": {"index": {"number_of_replicas": 1}}});
        assert_eq!(
            IndexProfile.update_body(&desired, &current, Dialect::V6).unwrap(),
            None
        );
    }

    #[test]
    fn static_setting_change_is_refused() {
        let desired = json!({"settings": {"number_of_shards": 6}});
        let current = json!({"settings": {"index": {"number_of_shards": "3"}}});
        let err = IndexProfile
            .update_body(&desired, &current, Dialect::V7)
            .unwrap_err();
        assert!(err.contains("index.number_of_shards"), "{err}");
    }
}
