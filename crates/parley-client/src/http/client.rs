//! HTTP transport struct, request execution, and outcome normalisation.

use std::error::Error as _;
use std::fmt::Write as _;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{TransportError, TransportResult};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Prefix for every endpoint path, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    /// Bound on a whole exchange; exceeding it yields `TransportError::Timeout`.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The limit that expired: reqwest flags connect timeouts as timeouts too.
    pub(crate) fn timeout_bound(&self, connecting: bool) -> Duration {
        if connecting {
            self.connect_timeout
        } else {
            self.request_timeout
        }
    }
}

/// Chat backend client over reqwest.
pub struct HttpTransport {
    pub(crate) config: TransportConfig,
    pub(crate) http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        Self::from_builder(config, reqwest::Client::builder())
    }

    /// Apply the configured timeouts on top of a caller-prepared builder.
    pub(crate) fn from_builder(
        config: TransportConfig,
        builder: reqwest::ClientBuilder,
    ) -> TransportResult<Self> {
        let http = builder
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Network(error_chain(&e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a prepared request and decode a success body as `T`.
    ///
    /// Network faults, non-success statuses and undecodable bodies all come
    /// back as `Err`; nothing escapes as a panic or a raw reqwest error.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        label: &str,
    ) -> TransportResult<T> {
        debug!(request = label, "backend request");

        let response = request.send().await.map_err(|e| self.network_error(e, label))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(e, label))?;

        if !status.is_success() {
            let err = TransportError::api(status.as_u16(), detail_from_body(&body));
            warn!(request = label, status = status.as_u16(), error = %err, "backend returned an error");
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!(request = label, error = %e, "backend response did not decode");
            TransportError::Malformed(e.to_string())
        })
    }

    fn network_error(&self, e: reqwest::Error, label: &str) -> TransportError {
        let err = if e.is_timeout() {
            TransportError::Timeout(self.config.timeout_bound(e.is_connect()))
        } else {
            TransportError::Network(error_chain(&e))
        };
        warn!(request = label, error = %err, "backend request failed");
        err
    }
}

/// Extract the backend's `detail` text from an error body.
///
/// Strings are taken verbatim; structured details (validation error lists)
/// are rendered as compact JSON. Anything else yields `None`.
pub(crate) fn detail_from_body(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        structured @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Some(structured.to_string())
        }
        _ => None,
    }
}

/// reqwest's top-level message omits the cause ("error sending request"),
/// so append the source chain.
fn error_chain(e: &reqwest::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let _ = write!(text, ": {cause}");
        source = cause.source();
    }
    text
}
