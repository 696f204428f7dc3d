use std::collections::BTreeMap;

/// Per-kind normalization rules.
///
/// Every rule is addressed by a dotted path pattern. A `*` segment matches
/// exactly one segment of the document path, including array positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeProfile {
    settings: Vec<(String, String)>,
    strip: Vec<String>,
    ordered: Vec<String>,
    embedded_json: Vec<String>,
    defaults: BTreeMap<String, String>,
}

impl NormalizeProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat the object at `path` as a settings document: flatten it and
    /// re-qualify every key not already under `namespace` (e.g. `"index."`).
    pub fn settings(mut self, path: &str, namespace: &str) -> Self {
        self.settings.push((path.to_string(), namespace.to_string()));
        self
    }

    /// Drop `pattern` and everything beneath it before comparison.
    pub fn strip(mut self, pattern: &str) -> Self {
        self.strip.push(pattern.to_string());
        self
    }

    pub fn strip_all(mut self, patterns: &[&str]) -> Self {
        self.strip.extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    /// Compare the array at `pattern` as a sequence instead of a set.
    pub fn ordered(mut self, pattern: &str) -> Self {
        self.ordered.push(pattern.to_string());
        self
    }

    /// String fields at `pattern` may carry serialized JSON; expand them
    /// when they parse to an object or array.
    pub fn embedded_json(mut self, pattern: &str) -> Self {
        self.embedded_json.push(pattern.to_string());
        self
    }

    /// A flattened value at `pattern` equal to `value` is server-added and
    /// compares as absent.
    pub fn default_value(mut self, pattern: &str, value: &str) -> Self {
        self.defaults.insert(pattern.to_string(), value.to_string());
        self
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub(crate) fn settings_namespace(&self, path: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(p, _)| matches_exact(p, path))
            .map(|(_, ns)| ns.as_str())
    }

    pub(crate) fn is_stripped(&self, path: &str) -> bool {
        self.strip.iter().any(|p| matches_prefix(p, path))
    }

    pub(crate) fn is_ordered(&self, path: &str) -> bool {
        self.ordered.iter().any(|p| matches_exact(p, path))
    }

    pub(crate) fn is_embedded_json(&self, path: &str) -> bool {
        self.embedded_json.iter().any(|p| matches_exact(p, path))
    }

    pub(crate) fn is_default(&self, path: &str, value: &str) -> bool {
        self.defaults
            .iter()
            .any(|(p, v)| v == value && matches_exact(p, path))
    }
}

fn segments(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('.').collect()
    }
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    pattern == "*" || pattern == segment
}

/// `pattern` names `path` itself.
pub(crate) fn matches_exact(pattern: &str, path: &str) -> bool {
    let p = segments(pattern);
    let s = segments(path);
    p.len() == s.len() && p.iter().zip(&s).all(|(p, s)| segment_matches(p, s))
}

/// `pattern` names `path` or one of its ancestors.
pub(crate) fn matches_prefix(pattern: &str, path: &str) -> bool {
    let p = segments(pattern);
    let s = segments(path);
    p.len() <= s.len() && p.iter().zip(&s).all(|(p, s)| segment_matches(p, s))
}
