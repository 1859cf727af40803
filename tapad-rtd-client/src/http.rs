//! reqwest-backed envelope transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tapad_rtd_core::{RtdResult, TransportError};

use crate::transport::EnvelopeTransport;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("tapad-rtd/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpTransportConfig {
    /// Create a new transport config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP transport with a cookie store, so credentials set by the envelope
/// service are sent back on later requests.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Create a new transport.
    pub fn new(config: HttpTransportConfig) -> RtdResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    /// Create a transport with default configuration.
    pub fn with_defaults() -> RtdResult<Self> {
        Self::new(HttpTransportConfig::default())
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl EnvelopeTransport for HttpTransport {
    async fn get(&self, url: &str) -> RtdResult<String> {
        let response = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| transport_error(url, e).into())
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Unreachable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.config.timeout)
            .field("user_agent", &self.config.user_agent)
            .finish()
    }
}
