//! HTTP transport seam.
//!
//! Providers build URLs and decode bodies; the transport only moves bytes.
//! Status handling stays in the providers so each can name its own upstream
//! in errors.

use super::provider::DataError;
use crate::config::HttpConfig;
use std::time::Duration;

/// HTTP response as seen by providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Blocking GET transport. One call, one network round-trip, no retries.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, DataError>;
}

/// Production transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, DataError> {
        tracing::debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::Network(format!("request timeout: {e}"))
            } else if e.is_connect() {
                DataError::Network(format!("connection failed: {e}"))
            } else {
                DataError::Network(format!("request failed: {e}"))
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| DataError::Network(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}
