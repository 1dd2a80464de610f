use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use loshon_shared::Document;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ascend_restore, reload_with_children, DeletedScope, DocumentFilter, DocumentRepository,
    RepoError,
};

/// In-process repository over a flat arena of rows.
///
/// Behaves like the Postgres repository, including the parent foreign key
/// and store-assigned timestamps, and can be told to fail writes so callers
/// can exercise `StorageError` paths.
pub struct MemoryDocumentRepository {
    rows: RwLock<Vec<Document>>,
    /// Writes left before failing; negative means never.
    writes_until_failure: AtomicI64,
}

impl Default for MemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            writes_until_failure: AtomicI64::new(-1),
        }
    }

    /// Lets `n` more writes succeed, then fails every write after that.
    pub fn fail_writes_after(&self, n: u32) {
        self.writes_until_failure.store(i64::from(n), Ordering::SeqCst);
    }

    pub fn stop_failing(&self) {
        self.writes_until_failure.store(-1, Ordering::SeqCst);
    }

    /// Raw row lookup that ignores soft deletion.
    pub async fn row(&self, id: Uuid) -> Option<Document> {
        self.rows.read().await.iter().find(|d| d.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_write(&self) -> Result<(), RepoError> {
        let budget = self
            .writes_until_failure
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                left if left > 0 => Some(left - 1),
                left => Some(left),
            });
        match budget {
            Ok(_) => Ok(()),
            Err(_) => Err(RepoError::Storage(sqlx::Error::Protocol(
                "injected write failure".to_string(),
            ))),
        }
    }

    /// Ids of `root` and every live descendant, breadth first.
    fn subtree(rows: &[Document], root: Uuid) -> Vec<Uuid> {
        let mut visited = HashSet::from([root]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            for child in rows
                .iter()
                .filter(|d| d.parent_id == Some(current) && !d.is_deleted())
            {
                if visited.insert(child.id) {
                    order.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }
        order
    }

    /// Applies `change` to the whole subtree under a single write lock.
    async fn cascade<F>(&self, root: Uuid, mut change: F) -> Result<usize, RepoError>
    where
        F: FnMut(&mut Document) + Send,
    {
        self.check_write()?;
        let mut rows = self.rows.write().await;
        if !rows.iter().any(|d| d.id == root) {
            return Err(RepoError::NotFound);
        }

        let members: HashSet<Uuid> = Self::subtree(&rows, root).into_iter().collect();
        let now = Utc::now();
        for doc in rows.iter_mut().filter(|d| members.contains(&d.id)) {
            change(doc);
            doc.updated_at = doc.updated_at.max(now);
        }
        Ok(members.len())
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn save(&self, doc: Document) -> Result<Document, RepoError> {
        self.check_write()?;
        let mut rows = self.rows.write().await;

        if let Some(parent_id) = doc.parent_id {
            if parent_id == doc.id || !rows.iter().any(|d| d.id == parent_id) {
                return Err(RepoError::Storage(sqlx::Error::Protocol(format!(
                    "parent_document_id {} violates foreign key",
                    parent_id
                ))));
            }
        }

        let now = Utc::now();
        let mut stored = doc;
        stored.children = Vec::new();

        match rows.iter_mut().find(|d| d.id == stored.id) {
            Some(existing) => {
                stored.owner_id = existing.owner_id.clone();
                stored.created_at = existing.created_at;
                stored.updated_at = existing.updated_at.max(now);
                stored.deleted_at = existing.deleted_at;
                stored.is_archived = existing.is_archived || stored.is_archived;
                *existing = stored.clone();
            }
            None => {
                stored.created_at = now;
                stored.updated_at = now;
                stored.deleted_at = None;
                rows.push(stored.clone());
            }
        }

        Ok(stored)
    }

    async fn unarchive(&self, id: Uuid) -> Result<Document, RepoError> {
        self.check_write()?;
        let mut rows = self.rows.write().await;
        let doc = rows
            .iter_mut()
            .find(|d| d.id == id && !d.is_deleted())
            .ok_or(RepoError::NotFound)?;

        doc.is_archived = false;
        doc.updated_at = doc.updated_at.max(Utc::now());
        Ok(doc.clone())
    }

    async fn first(&self, filter: &DocumentFilter) -> Result<Document, RepoError> {
        self.get(filter)
            .await?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound)
    }

    async fn get(&self, filter: &DocumentFilter) -> Result<Vec<Document>, RepoError> {
        let rows = self.rows.read().await;
        let mut found: Vec<Document> = rows.iter().filter(|d| filter.matches(d)).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps.
        found.sort_by_key(|d| d.created_at);
        Ok(found)
    }

    async fn archive(&self, doc: Document) -> Result<Document, RepoError> {
        let affected = self.cascade(doc.id, |d| d.is_archived = true).await?;
        tracing::debug!(document_id = %doc.id, affected, "archived subtree");

        let mut fallback = doc;
        fallback.is_archived = true;
        Ok(reload_with_children(self, fallback, DeletedScope::Exclude).await)
    }

    async fn restore(&self, doc: Document) -> Result<Document, RepoError> {
        ascend_restore(self, doc).await
    }

    async fn delete(&self, doc: Document) -> Result<Document, RepoError> {
        let now = Utc::now();
        let affected = self
            .cascade(doc.id, |d| {
                d.deleted_at.get_or_insert(now);
            })
            .await?;
        tracing::debug!(document_id = %doc.id, affected, "deleted subtree");

        let mut fallback = doc;
        fallback.deleted_at.get_or_insert(now);
        Ok(reload_with_children(self, fallback, DeletedScope::Include).await)
    }
}
