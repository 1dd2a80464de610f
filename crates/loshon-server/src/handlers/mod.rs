pub mod archives;
pub mod documents;

use loshon_shared::{validation::parse_uuid, Document, ValidationErrors};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::policy::ensure_owner;
use crate::repository::DocumentFilter;
use crate::routes::AppState;

/// Parses a document id taken from the route.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    let mut errors = ValidationErrors::new();
    let id = parse_uuid("id", raw, &mut errors);
    match id {
        Some(id) => Ok(id),
        None => Err(errors.into()),
    }
}

/// Loads a live document the caller is about to change.
async fn load_owned(state: &AppState, raw_id: &str, user: &AuthUser) -> Result<Document, AppError> {
    let id = parse_id(raw_id)?;
    let doc = state.repo.first(&DocumentFilter::by_id(id)).await?;
    ensure_owner(&doc, user)?;
    Ok(doc)
}
