use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{DocumentPatch, NewDocument};
use crate::patch::Patch;
use crate::validation::{check_title, parse_uuid, FieldError, ValidationErrors};

/// Response envelope used by every document endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, total: None }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        let total = data.len();
        Self {
            data,
            total: Some(total),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CreateDocumentRequest {
    pub fn validate(self) -> Result<NewDocument, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match self.title {
            Some(title) => {
                check_title("title", &title, &mut errors);
                title
            }
            None => {
                errors.push(FieldError::new("title", "required", Value::Null));
                String::new()
            }
        };
        let parent_id = self
            .parent_document_id
            .as_deref()
            .and_then(|raw| parse_uuid("parentDocumentId", raw, &mut errors));

        errors.into_result(NewDocument {
            title,
            is_published: self.is_published,
            parent_id,
            content: self.content,
            md_content: self.md_content,
            cover_image: self.cover_image,
            icon: self.icon,
        })
    }
}

/// Partial update body. Every field except `id` is tri-state.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    /// Taken from the route; a body value is overwritten.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub is_archived: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub is_published: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub parent_document_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub content: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub md_content: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub cover_image: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_undefined")]
    pub icon: Patch<String>,
}

/// An update request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidUpdate {
    pub id: Uuid,
    pub patch: DocumentPatch,
    /// `Some(true)` archives the subtree, `Some(false)` restores the chain.
    pub archive: Option<bool>,
}

impl UpdateDocumentRequest {
    pub fn validate(self) -> Result<ValidUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let id = if self.id.is_empty() {
            errors.push(FieldError::new("id", "required", Value::Null));
            None
        } else {
            parse_uuid("id", &self.id, &mut errors)
        };

        match &self.title {
            Patch::Value(title) => check_title("title", title, &mut errors),
            Patch::Null => errors.push(FieldError::new("title", "required", Value::Null)),
            Patch::Undefined => {}
        }
        let archive = match self.is_archived {
            Patch::Value(flag) => Some(flag),
            Patch::Null => {
                errors.push(FieldError::new("isArchived", "boolean", Value::Null));
                None
            }
            Patch::Undefined => None,
        };
        if self.is_published == Patch::Null {
            errors.push(FieldError::new("isPublished", "boolean", Value::Null));
        }
        let parent_id = match self.parent_document_id {
            Patch::Value(raw) => match parse_uuid("parentDocumentId", &raw, &mut errors) {
                Some(parent) => Patch::Value(parent),
                None => Patch::Undefined,
            },
            Patch::Null => Patch::Null,
            Patch::Undefined => Patch::Undefined,
        };

        let patch = DocumentPatch {
            title: self.title,
            is_published: self.is_published,
            parent_id,
            content: self.content,
            md_content: self.md_content,
            cover_image: self.cover_image,
            icon: self.icon,
        };
        match id {
            Some(id) if errors.is_empty() => Ok(ValidUpdate { id, patch, archive }),
            _ => Err(errors),
        }
    }
}

/// Query for `GET /documents`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Parent id; root documents when omitted or empty.
    #[serde(rename = "parentDocument", default, skip_serializing_if = "Option::is_none")]
    pub parent_document: Option<String>,
}

impl ListParams {
    pub fn parent_id(&self) -> Result<Option<Uuid>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let parent = match self.parent_document.as_deref() {
            None | Some("") => None,
            Some(raw) => parse_uuid("parentDocument", raw, &mut errors),
        };
        errors.into_result(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(body: &str) -> UpdateDocumentRequest {
        let mut req: UpdateDocumentRequest = serde_json::from_str(body).unwrap();
        req.id = Uuid::new_v4().to_string();
        req
    }

    #[test]
    fn create_requires_title() {
        let req: CreateDocumentRequest = serde_json::from_str("{}").unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(err.0[0].expected, "required");
    }

    #[test]
    fn create_parses_parent() {
        let parent = Uuid::new_v4();
        let req: CreateDocumentRequest = serde_json::from_value(serde_json::json!({
            "title": "Child",
            "parentDocumentId": parent.to_string(),
            "isPublished": true,
        }))
        .unwrap();
        let new = req.validate().unwrap();
        assert_eq!(new.parent_id, Some(parent));
        assert!(new.is_published);
    }

    #[test]
    fn create_rejects_bad_parent() {
        let req: CreateDocumentRequest =
            serde_json::from_str(r#"{"title": "Child", "parentDocumentId": "nope"}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.0[0].field, "parentDocumentId");
        assert_eq!(err.0[0].expected, "uuid");
    }

    #[test]
    fn short_title_names_the_field() {
        let err = update(r#"{"title": "X"}"#).validate().unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].field, "title");
        assert_eq!(err.0[0].expected, "min=2");
        assert_eq!(err.0[0].got, Value::String("X".into()));
    }

    #[test]
    fn null_title_is_rejected() {
        let err = update(r#"{"title": null}"#).validate().unwrap_err();
        assert_eq!(err.0[0].field, "title");
        assert_eq!(err.0[0].expected, "required");
    }

    #[test]
    fn malformed_id_is_rejected() {
        let mut req: UpdateDocumentRequest = serde_json::from_str("{}").unwrap();
        req.id = "not-a-uuid".to_string();
        let err = req.validate().unwrap_err();
        assert_eq!(err.0[0].field, "id");
        assert_eq!(err.0[0].expected, "uuid");
    }

    #[test]
    fn missing_id_is_rejected() {
        let req: UpdateDocumentRequest = serde_json::from_str(r#"{"title": "Fine"}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.0[0].field, "id");
        assert_eq!(err.0[0].expected, "required");
    }

    #[test]
    fn empty_body_yields_empty_patch() {
        let valid = update("{}").validate().unwrap();
        assert!(valid.patch.is_empty());
        assert_eq!(valid.archive, None);
    }

    #[test]
    fn null_parent_moves_to_root() {
        let valid = update(r#"{"parentDocumentId": null, "content": null}"#)
            .validate()
            .unwrap();
        assert_eq!(valid.patch.parent_id, Patch::Null);
        assert_eq!(valid.patch.content, Patch::Null);
        assert_eq!(valid.patch.title, Patch::Undefined);
    }

    #[test]
    fn archive_flag_is_split_from_patch() {
        let valid = update(r#"{"isArchived": true, "icon": "x"}"#).validate().unwrap();
        assert_eq!(valid.archive, Some(true));
        assert_eq!(valid.patch.icon, Patch::Value("x".to_string()));

        let err = update(r#"{"isArchived": null, "isPublished": null}"#)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["isArchived", "isPublished"]
        );
    }

    #[test]
    fn list_params_parent() {
        let params = ListParams::default();
        assert_eq!(params.parent_id().unwrap(), None);

        let id = Uuid::new_v4();
        let params = ListParams {
            parent_document: Some(id.to_string()),
        };
        assert_eq!(params.parent_id().unwrap(), Some(id));

        let params = ListParams {
            parent_document: Some("bad".to_string()),
        };
        assert!(params.parent_id().is_err());
    }

    #[test]
    fn list_envelope_reports_total() {
        let resp = ApiResponse::list(vec![1, 2, 3]);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["total"], 3);

        let single = serde_json::to_value(ApiResponse::new("x")).unwrap();
        assert!(single.get("total").is_none());
    }
}
