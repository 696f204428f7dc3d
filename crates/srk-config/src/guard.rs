//! Load-time guards: no literal secrets, and no keys nothing reads.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Leaf strings that start like a credential. Config holds env var names only.
const SECRET_PREFIXES: &[&str] = &[
    "-----BEGIN",
    "ApiKey ",
    "Basic ",
    "Bearer ",
    "AKIA",
    "ghp_",
    "glpat-",
    "xoxb-",
    "sk-",
];

/// Shorter strings are never treated as secrets.
const MIN_SECRET_LEN: usize = 8;

/// Config subtrees some crate reads.
const CONSUMED_POINTERS: &[&str] = &[
    "/cluster/url",
    "/cluster/dialect",
    "/cluster/timeout_secs",
    "/cluster/insecure_skip_verify",
    "/cluster/auth/username_env",
    "/cluster/auth/password_env",
    "/cluster/auth/api_key_env",
    "/cluster/headers",
];

/// JSON pointer of every scalar leaf, with the leaf.
fn leaves(v: &Value) -> Vec<(String, &Value)> {
    fn walk<'a>(v: &'a Value, at: String, out: &mut Vec<(String, &'a Value)>) {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    walk(child, format!("{at}/{token}"), out);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    walk(child, format!("{at}/{i}"), out);
                }
            }
            leaf => out.push((if at.is_empty() { "/".to_string() } else { at }, leaf)),
        }
    }
    let mut out = Vec::new();
    walk(v, String::new(), &mut out);
    out
}

pub(crate) fn reject_secret_literals(v: &Value) -> Result<()> {
    for (pointer, leaf) in leaves(v) {
        let Some(text) = leaf.as_str().map(str::trim) else {
            continue;
        };
        if text.len() >= MIN_SECRET_LEN && SECRET_PREFIXES.iter().any(|p| text.starts_with(p)) {
            bail!("CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unused keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Sorted, deduplicated leaf pointers.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// `/a/b` covers `/a/b` and `/a/b/c`, never `/a/bc`.
fn covered(pointer: &str) -> bool {
    CONSUMED_POINTERS.iter().any(|c| {
        pointer
            .strip_prefix(c)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Leaves no consumer reads. `Fail` turns a non-empty report into an error.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut unused: Vec<String> = leaves(config_json)
        .into_iter()
        .map(|(pointer, _)| pointer)
        .filter(|p| !covered(p))
        .collect();
    unused.sort();
    unused.dedup();

    if policy == UnusedKeyPolicy::Fail && !unused.is_empty() {
        let shown: Vec<&String> = unused.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) nothing reads: {shown:?}",
            unused.len()
        );
    }
    Ok(UnusedKeyReport {
        unused_leaf_pointers: unused,
    })
}
