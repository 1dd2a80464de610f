use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patch::Patch;

use super::SearchObject;

/// A node of a user's document forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub is_archived: bool,
    pub is_published: bool,
    #[serde(rename = "parentDocumentId")]
    pub parent_id: Option<Uuid>,
    pub content: Option<String>,
    /// Markdown rendering of `content`, kept for full-text indexing.
    pub md_content: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Direct children, filled in after a cascade for the caller's convenience.
    #[serde(skip)]
    pub children: Vec<Document>,
}

/// Validated fields for a new document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub is_published: bool,
    pub parent_id: Option<Uuid>,
    pub content: Option<String>,
    pub md_content: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
}

/// Validated partial update. `isArchived` is not part of it: archive state
/// only moves through the cascade and ascend operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Patch<String>,
    pub is_published: Patch<bool>,
    pub parent_id: Patch<Uuid>,
    pub content: Patch<String>,
    pub md_content: Patch<String>,
    pub cover_image: Patch<String>,
    pub icon: Patch<String>,
}

impl Document {
    pub fn new(owner_id: impl Into<String>, new: NewDocument) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            owner_id: owner_id.into(),
            is_archived: false,
            is_published: new.is_published,
            parent_id: new.parent_id,
            content: new.content,
            md_content: new.md_content,
            cover_image: new.cover_image,
            icon: new.icon,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            children: Vec::new(),
        }
    }

    /// Readable without ownership.
    pub fn is_public(&self) -> bool {
        self.is_published && !self.is_archived
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn apply_patch(&mut self, patch: DocumentPatch) {
        // Non-nullable fields only change on a value; validation rejects null.
        if let Patch::Value(title) = patch.title {
            self.title = title;
        }
        if let Patch::Value(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        patch.parent_id.apply_to(&mut self.parent_id);
        patch.content.apply_to(&mut self.content);
        patch.md_content.apply_to(&mut self.md_content);
        patch.cover_image.apply_to(&mut self.cover_image);
        patch.icon.apply_to(&mut self.icon);
    }

    pub fn to_search_object(&self) -> SearchObject {
        SearchObject {
            object_id: self.id.to_string(),
            user_id: self.owner_id.clone(),
            title: self.title.clone(),
            content: self.md_content.clone(),
            is_archived: self.is_archived,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_undefined()
            && self.is_published.is_undefined()
            && self.parent_id.is_undefined()
            && self.content.is_undefined()
            && self.md_content.is_undefined()
            && self.cover_image.is_undefined()
            && self.icon.is_undefined()
    }
}
