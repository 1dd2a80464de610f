//! Storage access for documents.
//!
//! Everything that reads or writes the `documents` table goes through
//! [`DocumentRepository`]. Handlers hold it as a trait object so the
//! Postgres implementation can be swapped for [`MemoryDocumentRepository`]
//! in tests.

mod memory;
mod postgres;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use loshon_shared::Document;
use uuid::Uuid;

pub use memory::MemoryDocumentRepository;
pub use postgres::PgDocumentRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("document not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Which side of the parent link a listing selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// `parentDocumentId IS NULL`
    Root,
    ChildOf(Uuid),
}

/// How soft-deleted rows are treated. Normal queries exclude them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedScope {
    #[default]
    Exclude,
    Include,
    Only,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub id: Option<Uuid>,
    pub owner_id: Option<String>,
    pub parent: Option<ParentFilter>,
    pub is_archived: Option<bool>,
    pub deleted: DeletedScope,
}

impl DocumentFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn parent(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent = Some(match parent_id {
            Some(id) => ParentFilter::ChildOf(id),
            None => ParentFilter::Root,
        });
        self
    }

    pub fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }

    pub fn deleted(mut self, scope: DeletedScope) -> Self {
        self.deleted = scope;
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if self.id.is_some_and(|id| doc.id != id) {
            return false;
        }
        if self.owner_id.as_deref().is_some_and(|owner| doc.owner_id != owner) {
            return false;
        }
        match self.parent {
            Some(ParentFilter::Root) if doc.parent_id.is_some() => return false,
            Some(ParentFilter::ChildOf(parent)) if doc.parent_id != Some(parent) => return false,
            _ => {}
        }
        if self.is_archived.is_some_and(|archived| doc.is_archived != archived) {
            return false;
        }
        match self.deleted {
            DeletedScope::Exclude => !doc.is_deleted(),
            DeletedScope::Include => true,
            DeletedScope::Only => doc.is_deleted(),
        }
    }
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert or update by id. Store-owned fields (`createdAt`, `updatedAt`,
    /// `deletedAt`, `userId` on update) come back from the store.
    ///
    /// On update `isArchived` can only be raised. A copy loaded before an
    /// archive cascade must not bring its row back to life.
    async fn save(&self, doc: Document) -> Result<Document, RepoError>;

    /// Clears the archive flag of one live row, leaving other fields alone.
    async fn unarchive(&self, id: Uuid) -> Result<Document, RepoError>;

    /// Exactly one match or `NotFound`.
    async fn first(&self, filter: &DocumentFilter) -> Result<Document, RepoError>;

    /// All matches ordered by `createdAt` ascending. Never `NotFound`.
    async fn get(&self, filter: &DocumentFilter) -> Result<Vec<Document>, RepoError>;

    /// Archives `doc` and its whole subtree in one store operation.
    async fn archive(&self, doc: Document) -> Result<Document, RepoError>;

    /// Un-archives `doc` and every archived ancestor.
    async fn restore(&self, doc: Document) -> Result<Document, RepoError>;

    /// Soft-deletes `doc` and its whole subtree in one store operation.
    async fn delete(&self, doc: Document) -> Result<Document, RepoError>;
}

pub type DynDocumentRepository = Arc<dyn DocumentRepository>;

/// Shared restore walk: un-archive the target, then climb parent links to
/// the root, un-archiving every archived ancestor on the way.
///
/// Every step is its own write. A failure part-way up leaves the target and
/// some ancestors restored. Live ancestors do not end the walk, so retrying
/// the same call reaches the archived ones above them.
pub(crate) async fn ascend_restore<R>(repo: &R, doc: Document) -> Result<Document, RepoError>
where
    R: DocumentRepository + ?Sized,
{
    let restored = repo.unarchive(doc.id).await?;

    let mut visited = HashSet::from([restored.id]);
    let mut next = restored.parent_id;

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            tracing::warn!(document_id = %restored.id, %parent_id, "parent cycle detected during restore");
            break;
        }

        let parent = repo.first(&DocumentFilter::by_id(parent_id)).await?;
        if parent.is_archived {
            repo.unarchive(parent.id).await?;
        }
        next = parent.parent_id;
    }

    Ok(restored)
}

/// Re-reads the cascade root and its direct children. With
/// `DeletedScope::Include` the children are those deleted together with the
/// root; earlier deletions are left out. Failure is not fatal:
/// the cascade already committed, so the caller gets the in-memory copy.
pub(crate) async fn reload_with_children<R>(
    repo: &R,
    fallback: Document,
    scope: DeletedScope,
) -> Document
where
    R: DocumentRepository + ?Sized,
{
    let id = fallback.id;
    let reloaded = async {
        let mut doc = repo.first(&DocumentFilter::by_id(id).deleted(scope)).await?;
        let mut children = repo
            .get(&DocumentFilter::default().parent(Some(id)).deleted(scope))
            .await?;
        if scope == DeletedScope::Include {
            // Only the children removed by this cascade share its stamp.
            let stamp = doc.deleted_at;
            children.retain(|child| child.deleted_at == stamp);
        }
        doc.children = children;
        Ok::<_, RepoError>(doc)
    }
    .await;

    match reloaded {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(document_id = %id, error = %e, "error reloading document after cascade");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loshon_shared::NewDocument;

    fn doc(owner: &str, parent: Option<Uuid>) -> Document {
        Document::new(
            owner,
            NewDocument {
                title: "Doc".to_string(),
                parent_id: parent,
                ..Default::default()
            },
        )
    }

    #[test]
    fn default_filter_excludes_deleted() {
        let mut d = doc("u1", None);
        assert!(DocumentFilter::default().matches(&d));
        d.deleted_at = Some(chrono::Utc::now());
        assert!(!DocumentFilter::default().matches(&d));
        assert!(DocumentFilter::default().deleted(DeletedScope::Include).matches(&d));
        assert!(DocumentFilter::default().deleted(DeletedScope::Only).matches(&d));
    }

    #[test]
    fn parent_filter_distinguishes_root() {
        let parent = Uuid::new_v4();
        let root = doc("u1", None);
        let child = doc("u1", Some(parent));

        let roots = DocumentFilter::owned_by("u1").parent(None);
        assert!(roots.matches(&root));
        assert!(!roots.matches(&child));

        let children = DocumentFilter::owned_by("u1").parent(Some(parent));
        assert!(!children.matches(&root));
        assert!(children.matches(&child));
    }

    #[test]
    fn owner_and_archive_flags() {
        let mut d = doc("u1", None);
        assert!(!DocumentFilter::owned_by("u2").matches(&d));
        assert!(DocumentFilter::owned_by("u1").archived(false).matches(&d));
        d.is_archived = true;
        assert!(!DocumentFilter::owned_by("u1").archived(false).matches(&d));
        assert!(DocumentFilter::by_id(d.id).archived(true).matches(&d));
    }
}
