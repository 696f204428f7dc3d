//! Blocking HTTP transport over `reqwest`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use srk_config::{ClusterSettings, ResolvedCredentials};

use crate::transport::{CancelToken, ClusterRequest, Method, RawResponse, Transport, TransportError};

/// Live transport for one cluster base URL.
///
/// Credentials are applied per request; the struct never prints them.
pub struct HttpTransport {
    http: Client,
    base_url: String,
    credentials: ResolvedCredentials,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(settings: &ClusterSettings, credentials: ResolvedCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name in /cluster/headers: {name}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid header value for {name}"))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(settings.insecure_skip_verify)
            .default_headers(headers)
            .build()
            .context("http client build failed")?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Io(e.to_string())
    }
}

impl Transport for HttpTransport {
    fn perform(
        &self,
        req: &ClusterRequest,
        cancel: &CancelToken,
    ) -> Result<RawResponse, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let url = self.url(&req.path);
        let mut builder = match req.method {
            Method::Get => self.http.get(url),
            Method::Put => self.http.put(url),
            Method::Post => self.http.post(url),
            Method::Delete => self.http.delete(url),
            Method::Head => self.http.head(url),
        };

        if let Some(key) = &self.credentials.api_key {
            builder = builder.header(AUTHORIZATION, format!("ApiKey {key}"));
        } else if let Some(user) = &self.credentials.username {
            builder = builder.basic_auth(user, self.credentials.password.as_ref());
        }

        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(map_reqwest_error)?;
        Ok(RawResponse { status, body })
    }
}
