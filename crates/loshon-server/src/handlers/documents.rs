use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use loshon_shared::{
    api::{ApiResponse, CreateDocumentRequest, ListParams, UpdateDocumentRequest, ValidUpdate},
    Document, Patch,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy;
use crate::repository::DocumentFilter;
use crate::routes::AppState;
use crate::{search, tree};

use super::{archives, parse_id};

/// GET /api/documents?parentDocument=:id
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    let parent_id = params.parent_id()?;

    let filter = DocumentFilter::owned_by(&user.id)
        .parent(parent_id)
        .archived(false);
    let documents = state.repo.get(&filter).await?;

    Ok(Json(ApiResponse::list(documents)))
}

/// GET /api/documents/:id
///
/// Anonymous callers get published, non-archived documents only.
pub async fn get_document(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let id = parse_id(&id)?;
    let document = state.repo.first(&DocumentFilter::by_id(id)).await?;

    let viewer = user.as_ref().map(|Extension(user)| user);
    policy::ensure_readable(&document, viewer)?;

    Ok(Json(ApiResponse::new(document)))
}

/// POST /api/documents
pub async fn create_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let new = req.validate()?;
    let mut document = Document::new(user.id.clone(), new);

    if let Some(parent_id) = document.parent_id {
        let parent = tree::ensure_parent_usable(state.repo.as_ref(), parent_id, &user).await?;
        // A live child under an archived parent would break the subtree rule.
        document.is_archived = parent.is_archived;
    }

    let document = state.repo.save(document).await?;
    tracing::info!(document_id = %document.id, owner = %document.owner_id, "document created");

    search::notify(state.search.as_ref(), &document).await;

    Ok(Json(ApiResponse::new(document)))
}

/// PATCH /api/documents/:id
pub async fn update_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateDocumentRequest>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    req.id = id;
    let ValidUpdate { id, patch, archive } = req.validate()?;

    let mut document = state.repo.first(&DocumentFilter::by_id(id)).await?;
    policy::ensure_owner(&document, &user)?;

    let mut moved_under_archived = false;
    if let Patch::Value(parent_id) = &patch.parent_id {
        if document.parent_id != Some(*parent_id) {
            tree::ensure_no_cycle(state.repo.as_ref(), document.id, *parent_id).await?;
            let parent = tree::ensure_parent_usable(state.repo.as_ref(), *parent_id, &user).await?;
            moved_under_archived = parent.is_archived;
        }
    }

    let archive = archive.or(moved_under_archived.then_some(true));
    let was_archived = document.is_archived;
    if moved_under_archived && archive == Some(true) {
        // The moved node is archived by this save; the cascade then covers
        // its descendants.
        document.is_archived = true;
    }

    document.apply_patch(patch);
    let document = state.repo.save(document).await?;
    tracing::debug!(document_id = %document.id, "document patched");

    // Clearing the flag only happens through the ascending restore.
    let document = match archive {
        Some(true) if !was_archived => {
            let document = state.repo.archive(document).await?;
            archives::reindex_owner(&state, &user, DocumentFilter::owned_by(&user.id).archived(true)).await;
            document
        }
        Some(false) if was_archived => {
            let document = state.repo.restore(document).await?;
            archives::reindex_owner(&state, &user, DocumentFilter::owned_by(&user.id).archived(false)).await;
            document
        }
        _ => {
            search::notify(state.search.as_ref(), &document).await;
            document
        }
    };

    Ok(Json(ApiResponse::new(document)))
}
