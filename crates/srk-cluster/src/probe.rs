use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use srk_config::{resolve_credentials, ClusterSettings, DialectSetting};
use srk_schemas::Dialect;
use tracing::info;

use crate::transport::{CancelToken, ClusterRequest, Method, Transport};
use crate::{ClusterHandle, HttpTransport};

#[derive(Debug, Deserialize)]
struct RootInfo {
    version: RootVersion,
}

#[derive(Debug, Deserialize)]
struct RootVersion {
    number: String,
    #[serde(default)]
    distribution: Option<String>,
}

/// Ask the cluster which API revision it speaks: `GET /` → `version.number`.
pub fn detect_dialect(transport: &dyn Transport, cancel: &CancelToken) -> Result<Dialect> {
    let resp = transport
        .perform(&ClusterRequest::new(Method::Get, "/"), cancel)
        .map_err(|e| anyhow!("dialect probe failed: {e}"))?;

    if !resp.is_success() {
        bail!(
            "dialect probe failed: GET / status={} body={}",
            resp.status,
            srk_schemas::WireContext::excerpt(&resp.body)
        );
    }

    let info: RootInfo =
        serde_json::from_str(&resp.body).context("dialect probe: GET / json decode failed")?;
    let dialect = Dialect::from_version_number(&info.version.number, info.version.distribution.as_deref())?;
    Ok(dialect)
}

/// Build the handle for `settings`: resolve credentials, build the HTTP
/// transport, and fix the dialect (pinned, or probed once).
pub fn connect(settings: &ClusterSettings, cancel: &CancelToken) -> Result<ClusterHandle> {
    let credentials = resolve_credentials(&settings.auth)?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(settings, credentials)?);

    let dialect = match settings.dialect {
        DialectSetting::Pinned(d) => d,
        DialectSetting::Auto => detect_dialect(transport.as_ref(), cancel)?,
    };
    info!(url = %settings.url, dialect = %dialect, "cluster handle ready");

    Ok(ClusterHandle::new(dialect, transport))
}
