//! Transport for the streaming analysis endpoint.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Chunked response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Request body of `POST /api/prepare`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest<'a> {
    pub job_description: &'a str,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Opens analysis streams.
///
/// The controller owns cancellation: it drops the returned stream when the
/// session is superseded, so implementations only need to release their
/// connection on drop.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Sends `job_description` and returns the raw response body.
    async fn open(&self, job_description: &str) -> Result<ByteStream>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Uses an existing client, sharing its connection pool.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Calls the backend liveness endpoint and returns its status string.
    pub async fn health(&self) -> Result<String> {
        let response = self
            .client
            .get(self.config.endpoint("/api/health"))
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
            });
        }

        let body: HealthResponse = response.json().await?;
        Ok(body.status)
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn open(&self, job_description: &str) -> Result<ByteStream> {
        let url = self.config.endpoint("/api/prepare");
        trace!(url = %url, "Opening analysis stream");

        let response = self
            .client
            .post(&url)
            .json(&PrepareRequest { job_description })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Analysis request rejected");
            return Err(ClientError::Http {
                status: status.as_u16(),
            });
        }

        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            debug!(status = status.as_u16(), "Analysis response has no body");
            return Err(ClientError::NoStream);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::Network(format!("Stream read error: {}", e))));

        Ok(Box::pin(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_request_body() {
        let body = serde_json::to_value(PrepareRequest {
            job_description: "Rust engineer",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"jobDescription": "Rust engineer"}));
    }

    #[tokio::test]
    async fn test_open_unreachable_backend_is_network_error() {
        let config = ClientConfig::new("http://127.0.0.1:1").unwrap();
        let transport = HttpTransport::new(config);

        let result = transport.open("anything").await;

        assert!(matches!(result, Err(ClientError::Network(_))));
    }
}
