//! Backend history over HTTP.

use async_trait::async_trait;
use prep_models::{AnalysisResult, SavedAnalysis};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use super::HistoryStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

const HISTORY_PATH: &str = "/api/history";

/// Body of `POST /api/history`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    job_description: &'a str,
    results: &'a AnalysisResult,
}

/// History stored by the analysis backend.
///
/// Every request carries the configured request timeout so an unreachable
/// backend fails over to local storage promptly.
#[derive(Debug, Clone)]
pub struct RemoteHistory {
    client: reqwest::Client,
    config: ClientConfig,
}

impl RemoteHistory {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    fn collection_url(&self) -> String {
        self.config.endpoint(HISTORY_PATH)
    }

    /// URL of one entry, with `id` percent-encoded as a path segment.
    fn entry_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.collection_url())
            .map_err(|e| ClientError::Config(format!("invalid history URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("backend URL cannot hold a path".to_string()))?
            .push(id);
        Ok(url)
    }
}

/// Maps non-success statuses to [`ClientError::Http`].
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Http {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl HistoryStore for RemoteHistory {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list(&self) -> Result<Vec<SavedAnalysis>> {
        trace!(url = %self.collection_url(), "Listing remote history");
        let response = self
            .client
            .get(self.collection_url())
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    async fn create(&self, entry: SavedAnalysis) -> Result<SavedAnalysis> {
        let response = self
            .client
            .post(self.collection_url())
            .timeout(self.config.request_timeout())
            .json(&CreateRequest {
                job_description: &entry.job_description,
                results: &entry.results,
            })
            .send()
            .await?;

        let saved: SavedAnalysis = check_status(response)?.json().await?;
        debug!(id = %saved.id, "Saved analysis remotely");
        Ok(saved)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.entry_url(id)?)
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(id, "Remote entry already gone");
            return Ok(());
        }
        check_status(response)?;
        Ok(())
    }
}
