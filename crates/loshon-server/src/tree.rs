//! Write-time guards that keep the parent links a forest.

use loshon_shared::Document;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy::ensure_owner;
use crate::repository::{DocumentFilter, DocumentRepository, RepoError};

/// Ancestor walks give up past this depth and treat the link as cyclic.
pub const MAX_DEPTH: usize = 1024;

/// Loads a prospective parent. It must exist, be live and belong to `user`.
pub async fn ensure_parent_usable(
    repo: &dyn DocumentRepository,
    parent_id: Uuid,
    user: &AuthUser,
) -> Result<Document, AppError> {
    let parent = match repo.first(&DocumentFilter::by_id(parent_id)).await {
        Ok(parent) => parent,
        Err(RepoError::NotFound) => {
            return Err(AppError::invalid(
                "parentDocumentId",
                "exists",
                parent_id.to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    ensure_owner(&parent, user)?;
    Ok(parent)
}

/// Rejects making `new_parent` the parent of `doc_id` when `doc_id` is
/// `new_parent` itself or one of its ancestors.
pub async fn ensure_no_cycle(
    repo: &dyn DocumentRepository,
    doc_id: Uuid,
    new_parent: Uuid,
) -> Result<(), AppError> {
    let cyclic = || AppError::invalid("parentDocumentId", "not a descendant", new_parent.to_string());

    let mut current = Some(new_parent);
    let mut depth = 0;

    while let Some(id) = current {
        if id == doc_id || depth >= MAX_DEPTH {
            return Err(cyclic());
        }
        current = match repo.first(&DocumentFilter::by_id(id)).await {
            Ok(doc) => doc.parent_id,
            // A missing ancestor ends the chain; the parent check reports it.
            Err(RepoError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        depth += 1;
    }

    Ok(())
}
