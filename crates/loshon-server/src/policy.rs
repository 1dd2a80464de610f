//! Who may see and touch a document.
//!
//! Published, non-archived documents are readable by anyone. Everything
//! else, reads and writes alike, is limited to the owner. A caller that
//! fails the check gets `Forbidden`; `NotFound` is reserved for rows that
//! do not exist.

use loshon_shared::Document;

use crate::auth::AuthUser;
use crate::error::AppError;

pub fn can_read(doc: &Document, viewer: Option<&AuthUser>) -> bool {
    doc.is_public() || viewer.is_some_and(|user| doc.is_owned_by(&user.id))
}

pub fn ensure_readable(doc: &Document, viewer: Option<&AuthUser>) -> Result<(), AppError> {
    if can_read(doc, viewer) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn ensure_owner(doc: &Document, user: &AuthUser) -> Result<(), AppError> {
    if doc.is_owned_by(&user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
