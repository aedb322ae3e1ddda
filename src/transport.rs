//! HTTP transport for delivery attempts

use crate::{DeliveryConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Response from a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, if one could be read
    pub body: Option<String>,
}

/// Failure below the HTTP layer: connection refused, timeout, DNS, TLS
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Abstraction over the HTTP request/response exchange.
///
/// The delivery engine only needs a status code and body back, or a
/// transport-level error; tests substitute scripted implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one POST to `url` with the given headers and body
    async fn send(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Production transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport from the engine configuration
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header("Content-Type", "application/json");

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.ok();
        debug!("Transport exchange with {} returned {}", url, status);

        Ok(TransportResponse { status, body })
    }
}
