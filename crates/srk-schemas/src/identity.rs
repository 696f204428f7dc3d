use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable external key naming a managed object.
///
/// Rendered as `id`, `index/id`, or `index/type/id`. The rendered form is what the
/// host persists between runs; [`ResourceIdentity::parse`] reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub index: Option<String>,
    pub doc_type: Option<String>,
    pub id: String,
}

impl ResourceIdentity {
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            index: None,
            doc_type: None,
            id: id.into(),
        }
    }

    pub fn in_index(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            doc_type: None,
            id: id.into(),
        }
    }

    pub fn typed(index: impl Into<String>, doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            doc_type: Some(doc_type.into()),
            id: id.into(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, IdentityParseError> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(IdentityParseError(s.to_string()));
        }
        match parts.as_slice() {
            [id] => Ok(Self::named(*id)),
            [index, id] => Ok(Self::in_index(*index, *id)),
            [index, doc_type, id] => Ok(Self::typed(*index, *doc_type, *id)),
            _ => Err(IdentityParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = &self.index {
            write!(f, "{index}/")?;
        }
        if let Some(doc_type) = &self.doc_type {
            write!(f, "{doc_type}/")?;
        }
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityParseError(pub String);

impl fmt::Display for IdentityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid resource identity '{}'. expected: id | index/id | index/type/id",
            self.0
        )
    }
}

impl std::error::Error for IdentityParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for raw in ["policy-a", ".kibana/dashboard:abc", ".kibana/dashboard/abc"] {
            let id = ResourceIdentity::parse(raw).unwrap();
            assert_eq!(id.to_string(), raw);
        }
    }

    #[test]
    fn parse_rejects_empty_segments_and_depth() {
        assert!(ResourceIdentity::parse("").is_err());
        assert!(ResourceIdentity::parse("a//b").is_err());
        assert!(ResourceIdentity::parse("a/b/c/d").is_err());
    }
}
