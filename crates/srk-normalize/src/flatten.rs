use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::profile::NormalizeProfile;

/// Segment standing in for an array position until unordered elements are sorted.
const PENDING_INDEX: &str = "#";

// ---------------------------------------------------------------------------
// Output type
// ---------------------------------------------------------------------------

/// Flattened, stripped, string-coerced form of one document.
///
/// Two documents are equivalent iff their `NormalizedDoc`s are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedDoc {
    fields: BTreeMap<String, String>,
}

impl NormalizedDoc {
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// SHA-256 over `path=value\n` lines in path order.
    pub fn fingerprint(&self) -> String {
        let mut h = Sha256::new();
        for (k, v) in &self.fields {
            h.update(k.as_bytes());
            h.update(b"=");
            h.update(v.as_bytes());
            h.update(b"\n");
        }
        hex::encode(h.finalize())
    }

    /// Flat JSON object of path → string value.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize `doc` under `profile`. Deterministic; never fails.
pub fn normalize(doc: &Value, profile: &NormalizeProfile) -> NormalizedDoc {
    let mut fields = BTreeMap::new();
    walk(doc, "", profile, &mut fields);
    fields.retain(|path, value| !profile.is_default(path, value));
    NormalizedDoc { fields }
}

/// Canonical string form of a scalar. `None` for null and containers.
pub fn coerce_scalar(v: &Value) -> Option<String> {
    match v {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(coerce_number(n)),
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // Integral floats below 2^53 print as integers so 1.0 == 1 == "1".
        Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn walk(v: &Value, path: &str, profile: &NormalizeProfile, out: &mut BTreeMap<String, String>) {
    if !path.is_empty() && profile.is_stripped(path) {
        return;
    }

    match v {
        Value::Null => {}
        Value::Object(map) => {
            if let Some(ns) = profile.settings_namespace(path) {
                for (key, leaf) in requalify(map, ns) {
                    walk(&leaf, &join(path, &key), profile, out);
                }
            } else {
                for (key, child) in map {
                    walk(child, &join(path, key), profile, out);
                }
            }
        }
        Value::Array(items) => {
            if profile.is_ordered(path) {
                for (i, item) in items.iter().enumerate() {
                    walk(item, &join(path, &i.to_string()), profile, out);
                }
            } else {
                walk_unordered(items, path, profile, out);
            }
        }
        Value::String(s) if profile.is_embedded_json(path) => {
            match serde_json::from_str::<Value>(s) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => {
                    walk(&parsed, path, profile, out)
                }
                _ => {
                    out.insert(path.to_string(), s.clone());
                }
            }
        }
        scalar => {
            if let Some(s) = coerce_scalar(scalar) {
                out.insert(path.to_string(), s);
            }
        }
    }
}

/// Elements are normalized independently, then sorted and de-duplicated so
/// that array order and repeats do not register as differences.
fn walk_unordered(
    items: &[Value],
    path: &str,
    profile: &NormalizeProfile,
    out: &mut BTreeMap<String, String>,
) {
    let pending = join(path, PENDING_INDEX);

    let mut elements: Vec<Vec<(String, String)>> = items
        .iter()
        .map(|item| {
            let mut sub = BTreeMap::new();
            walk(item, &pending, profile, &mut sub);
            sub.into_iter()
                .map(|(k, v)| (k[pending.len()..].to_string(), v))
                .collect::<Vec<_>>()
        })
        .filter(|pairs| !pairs.is_empty())
        .collect();
    elements.sort();
    elements.dedup();

    for (i, pairs) in elements.into_iter().enumerate() {
        let base = join(path, &i.to_string());
        for (suffix, value) in pairs {
            out.insert(format!("{base}{suffix}"), value);
        }
    }
}

/// Flatten a settings object to dotted keys and prefix every key that is
/// not already under `namespace`. `{"number_of_shards": 1}` and
/// `{"index": {"number_of_shards": 1}}` land on the same key.
fn requalify(map: &Map<String, Value>, namespace: &str) -> Vec<(String, Value)> {
    let mut flat = Vec::new();
    flatten_settings(map, "", &mut flat);
    flat.into_iter()
        .map(|(key, v)| {
            if key.starts_with(namespace) {
                (key, v)
            } else {
                (format!("{namespace}{key}"), v)
            }
        })
        .collect()
}

fn flatten_settings(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, v) in map {
        let full = join(prefix, key);
        match v {
            Value::Object(inner) => flatten_settings(inner, &full, out),
            other => out.push((full, other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> NormalizeProfile {
        NormalizeProfile::new()
    }

    #[test]
    fn flattens_nested_objects_to_dotted_paths() {
        let n = normalize(&json!({"a": {"b": {"c": 1}}, "d": true}), &plain());
        assert_eq!(n.get("a.b.c"), Some("1"));
        assert_eq!(n.get("d"), Some("true"));
        assert_eq!(n.len(), 2);
    }

    #[test]
    fn numbers_and_strings_coerce_to_one_form() {
        let a = normalize(&json!({"x": 1, "y": 2.0, "z": 0.25}), &plain());
        let b = normalize(&json!({"x": "1", "y": "2", "z": "0.25"}), &plain());
        assert_eq!(a, b);
    }

    #[test]
    fn nulls_and_empty_containers_vanish() {
        let n = normalize(&json!({"a": null, "b": {}, "c": [], "d": {"e": null}}), &plain());
        assert!(n.is_empty());
    }

    #[test]
    fn unordered_arrays_sort_and_dedup() {
        let a = normalize(&json!({"p": ["read", "write", "read"]}), &plain());
        let b = normalize(&json!({"p": ["write", "read"]}), &plain());
        assert_eq!(a, b);
        assert_eq!(a.get("p.0"), Some("read"));
    }

    #[test]
    fn unordered_arrays_of_objects_sort_by_content() {
        let a = normalize(
            &json!({"i": [{"names": ["b"], "privileges": ["all"]}, {"names": ["a"]}]}),
            &plain(),
        );
        let b = normalize(
            &json!({"i": [{"names": ["a"]}, {"privileges": ["all"], "names": ["b"]}]}),
            &plain(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn ordered_arrays_keep_positions() {
        let p = plain().ordered("index_patterns");
        let a = normalize(&json!({"index_patterns": ["b-*", "a-*"]}), &p);
        let b = normalize(&json!({"index_patterns": ["a-*", "b-*"]}), &p);
        assert_ne!(a, b);
        assert_eq!(a.get("index_patterns.0"), Some("b-*"));
    }

    #[test]
    fn settings_keys_are_requalified() {
        let p = plain().settings("settings", "index.");
        let a = normalize(&json!({"settings": {"number_of_shards": 1}}), &p);
        let b = normalize(&json!({"settings": {"index": {"number_of_shards": "1"}}}), &p);
        let c = normalize(&json!({"settings": {"index.number_of_shards": 1}}), &p);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.get("settings.index.number_of_shards"), Some("1"));
    }

    #[test]
    fn strip_removes_subtrees_including_dotted_settings_keys() {
        let p = plain()
            .settings("settings", "index.")
            .strip("settings.index.uuid")
            .strip("meta");
        let n = normalize(
            &json!({"settings": {"index": {"uuid": "abc", "refresh_interval": "1s"}}, "meta": {"x": 1}}),
            &p,
        );
        assert_eq!(n.len(), 1);
        assert_eq!(n.get("settings.index.refresh_interval"), Some("1s"));
    }

    #[test]
    fn wildcard_strip_reaches_into_unordered_elements() {
        let p = plain().strip("items.*.seq");
        let a = normalize(&json!({"items": [{"k": "a", "seq": 4}, {"k": "b", "seq": 9}]}), &p);
        let b = normalize(&json!({"items": [{"k": "b"}, {"k": "a"}]}), &p);
        assert_eq!(a, b);
    }

    #[test]
    fn embedded_json_expands_objects_and_keeps_plain_strings() {
        let p = plain().embedded_json("rules");
        let a = normalize(&json!({"rules": "{\"field\":{\"username\":\"*\"}}"}), &p);
        let b = normalize(&json!({"rules": {"field": {"username": "*"}}}), &p);
        assert_eq!(a, b);

        let verbatim = normalize(&json!({"rules": "not json"}), &p);
        assert_eq!(verbatim.get("rules"), Some("not json"));
    }

    #[test]
    fn defaults_compare_as_absent() {
        let p = plain().default_value("order", "0");
        assert_eq!(
            normalize(&json!({"order": 0, "a": 1}), &p),
            normalize(&json!({"a": 1}), &p)
        );
        assert_eq!(normalize(&json!({"order": 3}), &p).get("order"), Some("3"));
    }

    #[test]
    fn fingerprint_is_stable_and_order_free() {
        let a = normalize(&json!({"x": 1, "y": {"z": [2, 1]}}), &plain());
        let b = normalize(&json!({"y": {"z": [1, 2]}, "x": "1"}), &plain());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
