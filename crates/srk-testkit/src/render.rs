//! Server-side rendering of settings: dotted, `index.`-qualified, string-valued.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Scalars become strings; arrays keep their shape with stringified elements.
pub(crate) fn stringify(v: &Value) -> Value {
    match v {
        Value::String(_) => v.clone(),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(stringify).collect()),
        Value::Object(m) => Value::Object(m.iter().map(|(k, v)| (k.clone(), stringify(v))).collect()),
        Value::Null => Value::Null,
    }
}

/// Flatten a settings object to dotted keys under `index.`.
pub(crate) fn flatten_settings(v: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Value::Object(m) = v {
        walk(m, "", &mut out);
    }
    out.into_iter()
        .map(|(k, v)| {
            if k.starts_with("index.") {
                (k, v)
            } else {
                (format!("index.{k}"), v)
            }
        })
        .collect()
}

fn walk(m: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, Value>) {
    for (k, v) in m {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        match v {
            Value::Object(inner) => walk(inner, &key, out),
            Value::Null => {}
            other => {
                out.insert(key, stringify(other));
            }
        }
    }
}

/// Rebuild the nested object form from dotted keys.
pub(crate) fn nest(flat: &BTreeMap<String, Value>) -> Value {
    let mut root = Map::new();
    for (key, value) in flat {
        let parts: Vec<&str> = key.split('.').collect();
        let mut cur = &mut root;
        for part in &parts[..parts.len() - 1] {
            let slot = cur
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            cur = match slot {
                Value::Object(m) => m,
                _ => unreachable!("slot was just made an object"),
            };
        }
        cur.insert(parts[parts.len() - 1].to_string(), value.clone());
    }
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_then_nest_qualifies_and_stringifies() {
        let flat = flatten_settings(&json!({"number_of_shards": 1, "index": {"refresh_interval": "1s"}}));
        assert_eq!(flat.get("index.number_of_shards"), Some(&json!("1")));
        assert_eq!(
            nest(&flat),
            json!({"index": {"number_of_shards": "1", "refresh_interval": "1s"}})
        );
    }
}
