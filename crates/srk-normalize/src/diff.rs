use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::flatten::{normalize, NormalizedDoc};
use crate::profile::NormalizeProfile;

/// One flattened path whose value differs. `None` means absent on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub path: String,
    pub desired: Option<String>,
    pub remote: Option<String>,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "<absent>".to_string());
        write!(f, "{}: {} -> {}", self.path, show(&self.remote), show(&self.desired))
    }
}

/// Result of the diff-suppression hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "diffs", rename_all = "snake_case")]
pub enum DiffVerdict {
    Equivalent,
    /// Sorted by path.
    Diverged(Vec<FieldDiff>),
}

impl DiffVerdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, DiffVerdict::Equivalent)
    }

    pub fn diffs(&self) -> &[FieldDiff] {
        match self {
            DiffVerdict::Equivalent => &[],
            DiffVerdict::Diverged(d) => d,
        }
    }
}

/// Normalize both sides and compare.
pub fn compare(desired: &Value, remote: &Value, profile: &NormalizeProfile) -> DiffVerdict {
    diff_normalized(&normalize(desired, profile), &normalize(remote, profile))
}

pub fn diff_normalized(desired: &NormalizedDoc, remote: &NormalizedDoc) -> DiffVerdict {
    let d = desired.fields();
    let r = remote.fields();

    let mut paths: Vec<&String> = d.keys().chain(r.keys()).collect();
    paths.sort();
    paths.dedup();

    let diffs: Vec<FieldDiff> = paths
        .into_iter()
        .filter(|p| d.get(*p) != r.get(*p))
        .map(|p| FieldDiff {
            path: p.clone(),
            desired: d.get(p).cloned(),
            remote: r.get(p).cloned(),
        })
        .collect();

    if diffs.is_empty() {
        DiffVerdict::Equivalent
    } else {
        DiffVerdict::Diverged(diffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_changed_added_and_removed_paths() {
        let v = compare(
            &json!({"a": 1, "b": "x"}),
            &json!({"a": 2, "c": true}),
            &NormalizeProfile::new(),
        );
        let paths: Vec<&str> = v.diffs().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
        assert_eq!(v.diffs()[1].remote, None);
        assert_eq!(v.diffs()[2].desired, None);
    }

    #[test]
    fn equivalent_has_no_diffs() {
        let v = compare(&json!({"a": "1"}), &json!({"a": 1}), &NormalizeProfile::new());
        assert!(v.is_equivalent());
        assert!(v.diffs().is_empty());
    }

    #[test]
    fn display_reads_remote_to_desired() {
        let d = FieldDiff {
            path: "settings.index.number_of_replicas".to_string(),
            desired: Some("2".to_string()),
            remote: None,
        };
        assert_eq!(d.to_string(), "settings.index.number_of_replicas: <absent> -> 2");
    }
}
