use std::time::Duration;

use async_trait::async_trait;
use loshon_shared::SearchObject;
use reqwest::Client;
use serde::Serialize;

use crate::config::SearchConfig;

use super::{SearchError, SearchSync};

/// Largest batch sent in one request.
const BATCH_SIZE: usize = 1000;

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: Vec<BatchOperation<'a>>,
}

#[derive(Serialize)]
struct BatchOperation<'a> {
    action: &'static str,
    body: &'a SearchObject,
}

/// Client for an Algolia-compatible REST index.
pub struct AlgoliaClient {
    client: Client,
    base_url: String,
    app_id: String,
    api_key: String,
    index: String,
}

impl AlgoliaClient {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("https://{}.algolia.net", config.app_id),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
            index: config.index.clone(),
        })
    }

    /// Points the client at another host, e.g. a local stand-in.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn batch_url(&self) -> String {
        format!("{}/1/indexes/{}/batch", self.base_url, self.index)
    }

    async fn send_batch(&self, objects: &[SearchObject]) -> Result<(), SearchError> {
        let body = BatchRequest {
            requests: objects
                .iter()
                .map(|body| BatchOperation {
                    action: "updateObject",
                    body,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.batch_url())
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchSync for AlgoliaClient {
    async fn save_objects(&self, objects: &[SearchObject]) -> Result<(), SearchError> {
        for chunk in objects.chunks(BATCH_SIZE) {
            self.send_batch(chunk).await?;
            tracing::debug!(index = %self.index, count = chunk.len(), "batch indexed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SearchConfig {
        SearchConfig {
            app_id: "APPID".to_string(),
            api_key: "key".to_string(),
            index: "documents".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn batch_url_targets_index() {
        let client = AlgoliaClient::new(&config()).unwrap();
        assert_eq!(
            client.batch_url(),
            "https://APPID.algolia.net/1/indexes/documents/batch"
        );

        let local = client.with_base_url("http://localhost:7700/");
        assert_eq!(local.batch_url(), "http://localhost:7700/1/indexes/documents/batch");
    }
}
