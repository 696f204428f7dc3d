//! srk-config
//!
//! Layered YAML configuration for the cluster connection.
//!
//! - Documents merge in order: earlier docs are the base, later docs override.
//! - The merged document is canonicalized and hashed (SHA-256) so a run can
//!   record exactly which connection settings it used.
//! - Secrets never appear as literal values: the YAML names environment
//!   variables, and [`secrets::resolve_credentials`] reads them once.

mod guard;
mod layered;
pub mod secrets;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use srk_schemas::Dialect;
use std::collections::BTreeMap;

pub use guard::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
pub use layered::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use secrets::{resolve_credentials, ResolvedCredentials};

/// Default per-request timeout when `cluster.timeout_secs` is absent.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Typed cluster settings
// ---------------------------------------------------------------------------

/// How the API dialect is chosen when the cluster handle is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectSetting {
    /// Probe `GET /` and map `version.number`.
    Auto,
    Pinned(Dialect),
}

impl DialectSetting {
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(DialectSetting::Auto);
        }
        Ok(DialectSetting::Pinned(Dialect::parse(s)?))
    }
}

/// Env var NAMES holding credentials. Values are resolved separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEnvNames {
    #[serde(default)]
    pub username_env: Option<String>,
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawClusterSection {
    url: String,
    #[serde(default = "default_dialect")]
    dialect: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    insecure_skip_verify: bool,
    #[serde(default)]
    auth: AuthEnvNames,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

fn default_dialect() -> String {
    "auto".to_string()
}

/// Connection settings for one cluster, parsed from `/cluster`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub url: String,
    pub dialect: DialectSetting,
    pub timeout_secs: u64,
    pub insecure_skip_verify: bool,
    pub auth: AuthEnvNames,
    /// Extra static headers sent on every request.
    pub headers: BTreeMap<String, String>,
}

impl ClusterSettings {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let section = config_json
            .get("cluster")
            .context("CONFIG_MISSING_SECTION: /cluster is required")?;
        let raw: RawClusterSection = serde_json::from_value(section.clone())
            .context("CONFIG_INVALID: /cluster does not match the expected shape")?;

        let url = raw.url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!(
                "CONFIG_INVALID: /cluster/url must start with http:// or https://, got '{}'",
                url
            );
        }

        let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("CONFIG_INVALID: /cluster/timeout_secs must be > 0");
        }

        Ok(Self {
            url,
            dialect: DialectSetting::parse(&raw.dialect)?,
            timeout_secs,
            insecure_skip_verify: raw.insecure_skip_verify,
            auth: raw.auth,
            headers: raw.headers,
        })
    }
}
