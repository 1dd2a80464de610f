use axum::{
    extract::{Path, State},
    Extension, Json,
};
use loshon_shared::{api::ApiResponse, Document};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::repository::{DeletedScope, DocumentFilter};
use crate::routes::AppState;
use crate::search;

use super::load_owned;

/// Re-sends the caller's documents matching `filter` to the search index.
/// Runs after the store write; failures only get logged.
pub(crate) async fn reindex_owner(state: &AppState, user: &AuthUser, filter: DocumentFilter) {
    match state.repo.get(&filter).await {
        Ok(documents) => search::reindex(state.search.as_ref(), &documents).await,
        Err(e) => tracing::warn!(owner = %user.id, error = %e, "failed to load documents for reindex"),
    }
}

/// DELETE /api/documents/:id
pub async fn archive_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let document = load_owned(&state, &id, &user).await?;
    let document = state.repo.archive(document).await?;
    tracing::info!(document_id = %document.id, "document archived");

    reindex_owner(&state, &user, DocumentFilter::owned_by(&user.id).archived(true)).await;

    Ok(Json(ApiResponse::new(document)))
}

/// GET /api/documents/_archives
pub async fn list_archived(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    let documents = state
        .repo
        .get(&DocumentFilter::owned_by(&user.id).archived(true))
        .await?;

    Ok(Json(ApiResponse::list(documents)))
}

/// PATCH /api/documents/_restore/:id
pub async fn restore_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let document = load_owned(&state, &id, &user).await?;
    let document = state.repo.restore(document).await?;
    tracing::info!(document_id = %document.id, "document restored");

    reindex_owner(&state, &user, DocumentFilter::owned_by(&user.id).archived(false)).await;

    Ok(Json(ApiResponse::new(document)))
}

/// DELETE /api/documents/_delete/:id
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let document = load_owned(&state, &id, &user).await?;
    let document = state.repo.delete(document).await?;
    tracing::info!(document_id = %document.id, "document deleted");

    reindex_owner(
        &state,
        &user,
        DocumentFilter::owned_by(&user.id).deleted(DeletedScope::Only),
    )
    .await;

    Ok(Json(ApiResponse::new(document)))
}
