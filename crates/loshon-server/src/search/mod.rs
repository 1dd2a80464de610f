//! Write-behind sync of document projections to the search index.
//!
//! Sync runs after the store write has committed and is not part of it.
//! Failures are logged and dropped: the index may go stale until the next
//! `reindex` run, but a document mutation never fails because of it.

mod algolia;

use std::sync::Arc;

use async_trait::async_trait;
use loshon_shared::{Document, SearchObject};

pub use algolia::AlgoliaClient;

use crate::config::SearchConfig;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search service returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait SearchSync: Send + Sync {
    /// Upserts `objects` keyed by `objectID`.
    async fn save_objects(&self, objects: &[SearchObject]) -> Result<(), SearchError>;

    async fn save_object(&self, object: &SearchObject) -> Result<(), SearchError> {
        self.save_objects(std::slice::from_ref(object)).await
    }
}

pub type DynSearchSync = Arc<dyn SearchSync>;

/// Used when no search service is configured.
pub struct NoopSearch;

#[async_trait]
impl SearchSync for NoopSearch {
    async fn save_objects(&self, objects: &[SearchObject]) -> Result<(), SearchError> {
        tracing::debug!(count = objects.len(), "search sync disabled, skipping");
        Ok(())
    }
}

pub fn from_config(config: Option<&SearchConfig>) -> anyhow::Result<DynSearchSync> {
    match config {
        Some(config) => Ok(Arc::new(AlgoliaClient::new(config)?)),
        None => {
            tracing::warn!("SEARCH_APP_ID / SEARCH_API_KEY not set, search sync disabled");
            Ok(Arc::new(NoopSearch))
        }
    }
}

/// Pushes one document's projection.
pub async fn notify(search: &dyn SearchSync, doc: &Document) {
    if let Err(e) = search.save_object(&doc.to_search_object()).await {
        tracing::warn!(document_id = %doc.id, error = %e, "failed to save object");
    }
}

/// Pushes the projections of `docs`.
pub async fn reindex(search: &dyn SearchSync, docs: &[Document]) {
    if docs.is_empty() {
        return;
    }

    let objects: Vec<SearchObject> = docs.iter().map(Document::to_search_object).collect();
    match search.save_objects(&objects).await {
        Ok(()) => tracing::info!(count = objects.len(), "objects indexed"),
        Err(e) => tracing::warn!(error = %e, count = objects.len(), "failed to save objects"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loshon_shared::NewDocument;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Flaky {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl SearchSync for Flaky {
        async fn save_objects(&self, _objects: &[SearchObject]) -> Result<(), SearchError> {
            *self.calls.lock().unwrap() += 1;
            Err(SearchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn doc() -> Document {
        Document::new(
            "u1",
            NewDocument {
                title: "Doc".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let search = Flaky::default();
        notify(&search, &doc()).await;
        assert_eq!(*search.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_reindex_skips_the_call() {
        let search = Flaky::default();
        reindex(&search, &[]).await;
        assert_eq!(*search.calls.lock().unwrap(), 0);
    }
}
