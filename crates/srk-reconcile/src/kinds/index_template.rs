use serde_json::{json, Value};
use srk_normalize::NormalizeProfile;
use srk_schemas::{Dialect, ResourceKind};

use super::KindProfile;

/// V5 templates carry a single `template` pattern; later dialects an
/// ordered `index_patterns` list. Bodies are kept in the list form and
/// translated at the V5 boundary.
#[derive(Debug)]
pub struct IndexTemplateProfile;

impl KindProfile for IndexTemplateProfile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IndexTemplate
    }

    fn normalize_profile(&self, _dialect: Dialect) -> NormalizeProfile {
        NormalizeProfile::new()
            .settings("settings", "index.")
            .ordered("index_patterns")
            .default_value("order", "0")
    }

    fn write_body(&self, desired: &Value, dialect: Dialect) -> Result<Value, String> {
        let mut body = desired.clone();
        let Some(obj) = body.as_object_mut() else {
            return Err("index-template body must be a JSON object".to_string());
        };

        match dialect {
            Dialect::V5 => {
                if let Some(patterns) = obj.remove("index_patterns") {
                    let single = match patterns {
                        Value::String(s) => s,
                        Value::Array(mut items) if items.len() == 1 => match items.remove(0) {
                            Value::String(s) => s,
                            other => return Err(format!("index pattern must be a string, got {other}")),
                        },
                        other => {
                            return Err(format!(
                                "v5 templates take exactly one index pattern, got {other}"
                            ))
                        }
                    };
                    obj.insert("template".to_string(), Value::String(single));
                }
            }
            Dialect::V6 | Dialect::V7 => {
                if !obj.contains_key("index_patterns") {
                    if let Some(Value::String(single)) = obj.remove("template") {
                        obj.insert("index_patterns".to_string(), json!([single]));
                    }
                }
            }
        }
        Ok(body)
    }

    fn read_body(&self, remote: Value, _dialect: Dialect) -> Value {
        list_form(remote)
    }

    fn desired_shape(&self, desired: &Value, _dialect: Dialect) -> Value {
        list_form(desired.clone())
    }
}

/// `template: "p"` becomes `index_patterns: ["p"]` unless a list is present.
fn list_form(mut body: Value) -> Value {
    if let Some(obj) = body.as_object_mut() {
        if !obj.contains_key("index_patterns") {
            if let Some(Value::String(single)) = obj.remove("template") {
                obj.insert("index_patterns".to_string(), json!([single]));
            }
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use srk_normalize::compare;

    #[test]
    fn v5_write_uses_template_field() {
        let desired = json!({"index_patterns": ["logs-*"], "order": 1});
        let body = IndexTemplateProfile.write_body(&desired, Dialect::V5).unwrap();
        assert_eq!(body, json!({"template": "logs-*", "order": 1}));
    }

    #[test]
    fn v5_rejects_multiple_patterns() {
        let desired = json!({"index_patterns": ["a-*", "b-*"]});
        assert!(IndexTemplateProfile.write_body(&desired, Dialect::V5).is_err());
    }

    #[test]
    fn v7_accepts_legacy_template_field() {
        let desired = json!({"template": "logs-*"});
        let body = IndexTemplateProfile.write_body(&desired, Dialect::V7).unwrap();
        assert_eq!(body, json!({"index_patterns": ["logs-*"]}));
    }

    #[test]
    fn v5_read_round_trips_to_list_form() {
        let remote = json!({"template": "logs-*", "order": 0, "settings": {"index": {"number_of_shards": "1"}}});
        let read = IndexTemplateProfile.read_body(remote, Dialect::V5);
        let desired = json!({"index_patterns": ["logs-*"], "settings": {"number_of_shards": 1}});
        let p = IndexTemplateProfile.normalize_profile(Dialect::V5);
        assert!(compare(&desired, &read, &p).is_equivalent());
    }

    #[test]
    fn legacy_desired_matches_list_form_remote() {
        let desired = json!({"template": "logs-*", "settings": {"number_of_shards": 1}});
        let remote = json!({"order": 0, "index_patterns": ["logs-*"], "settings": {"index": {"number_of_shards": "1"}}});
        let p = IndexTemplateProfile.normalize_profile(Dialect::V7);

        assert!(!compare(&desired, &remote, &p).is_equivalent());
        let shaped = IndexTemplateProfile.desired_shape(&desired, Dialect::V7);
        assert!(compare(&shaped, &remote, &p).is_equivalent());
    }
}
