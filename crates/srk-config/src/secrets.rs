//! Credential resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"SRK_CLUSTER_PASSWORD"`).
//! - Callers invoke [`resolve_credentials`] once when the cluster handle is built
//!   and pass the result to the transport constructor.
//! - `Debug` output redacts every value.
//! - Error messages reference the env var NAME, never the value.
//!
//! Basic auth (username + password) and API-key auth are mutually exclusive.
//! Neither configured means anonymous access.

use anyhow::{bail, Result};

use crate::AuthEnvNames;

/// Credentials read from the environment for one cluster handle.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sent as `Authorization: ApiKey <value>`.
    pub api_key: Option<String>,
}

impl ResolvedCredentials {
    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() && self.api_key.is_none()
    }
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("username", &self.username.as_ref().map(|_| "<REDACTED>"))
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn required(var_name: &str, what: &str) -> Result<String> {
    match resolve_env(var_name) {
        Some(v) => Ok(v),
        None => bail!(
            "SECRETS_MISSING: required env var '{}' ({}) is not set or empty",
            var_name,
            what
        ),
    }
}

/// Resolve credentials named by `auth` from the process environment.
///
/// # Errors
/// - both basic and api-key auth configured
/// - username configured without password (or the reverse)
/// - a configured variable is unset or blank
pub fn resolve_credentials(auth: &AuthEnvNames) -> Result<ResolvedCredentials> {
    let basic = auth.username_env.is_some() || auth.password_env.is_some();
    if basic && auth.api_key_env.is_some() {
        bail!("CONFIG_INVALID: /cluster/auth sets both basic auth and api_key_env; pick one");
    }

    if let Some(key_var) = &auth.api_key_env {
        return Ok(ResolvedCredentials {
            username: None,
            password: None,
            api_key: Some(required(key_var, "api key")?),
        });
    }

    match (&auth.username_env, &auth.password_env) {
        (Some(user_var), Some(pass_var)) => Ok(ResolvedCredentials {
            username: Some(required(user_var, "username")?),
            password: Some(required(pass_var, "password")?),
            api_key: None,
        }),
        (Some(_), None) => {
            bail!("CONFIG_INVALID: /cluster/auth/username_env is set without password_env")
        }
        (None, Some(_)) => {
            bail!("CONFIG_INVALID: /cluster/auth/password_env is set without username_env")
        }
        (None, None) => Ok(ResolvedCredentials::default()),
    }
}
