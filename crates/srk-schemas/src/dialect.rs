use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three incompatible revisions of the cluster management API.
///
/// Named after the server major version that introduced the revision.
/// OpenSearch 1.x speaks the V7 revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    V5,
    V6,
    V7,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::V5, Dialect::V6, Dialect::V7];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::V5 => "v5",
            Dialect::V6 => "v6",
            Dialect::V7 => "v7",
        }
    }

    /// Parse a configured dialect name (`v5`, `6`, `V7`, ...).
    pub fn parse(s: &str) -> Result<Self, DialectParseError> {
        match s.trim().to_ascii_lowercase().trim_start_matches('v') {
            "5" => Ok(Dialect::V5),
            "6" => Ok(Dialect::V6),
            "7" => Ok(Dialect::V7),
            _ => Err(DialectParseError(s.to_string())),
        }
    }

    /// Map a server-reported `version.number` (e.g. `"7.10.2"`) to its dialect.
    ///
    /// `distribution == "opensearch"` reports its own 1.x numbering but speaks V7.
    pub fn from_version_number(
        number: &str,
        distribution: Option<&str>,
    ) -> Result<Self, DialectParseError> {
        let major = number
            .trim()
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| DialectParseError(number.to_string()))?;

        if distribution == Some("opensearch") {
            return match major {
                1 => Ok(Dialect::V7),
                _ => Err(DialectParseError(format!("opensearch {number}"))),
            };
        }

        match major {
            5 => Ok(Dialect::V5),
            6 => Ok(Dialect::V6),
            7 => Ok(Dialect::V7),
            _ => Err(DialectParseError(number.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized dialect name or server version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectParseError(pub String);

impl fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported api dialect '{}'. expected one of: v5 | v6 | v7",
            self.0
        )
    }
}

impl std::error::Error for DialectParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_prefixed_and_bare() {
        assert_eq!(Dialect::parse("v5").unwrap(), Dialect::V5);
        assert_eq!(Dialect::parse("6").unwrap(), Dialect::V6);
        assert_eq!(Dialect::parse(" V7 ").unwrap(), Dialect::V7);
        assert!(Dialect::parse("v8").is_err());
    }

    #[test]
    fn version_number_maps_major() {
        assert_eq!(
            Dialect::from_version_number("5.6.16", None).unwrap(),
            Dialect::V5
        );
        assert_eq!(
            Dialect::from_version_number("6.8.23", None).unwrap(),
            Dialect::V6
        );
        assert_eq!(
            Dialect::from_version_number("7.10.2", None).unwrap(),
            Dialect::V7
        );
        assert!(Dialect::from_version_number("8.1.0", None).is_err());
        assert!(Dialect::from_version_number("garbage", None).is_err());
    }

    #[test]
    fn opensearch_one_speaks_v7() {
        assert_eq!(
            Dialect::from_version_number("1.3.0", Some("opensearch")).unwrap(),
            Dialect::V7
        );
        assert!(Dialect::from_version_number("2.0.0", Some("opensearch")).is_err());
    }
}
