use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    /// Constraint tag, e.g. `required`, `min=2`, `uuid`.
    pub expected: String,
    pub got: Value,
}

impl FieldError {
    pub fn new(field: &str, expected: impl Into<String>, got: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            expected: expected.into(),
            got: got.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("invalid fields: {}", .0.iter().map(|e| e.field.as_str()).collect::<Vec<_>>().join(", "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    /// `Ok(value)` if nothing was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

pub const TITLE_MIN_LEN: usize = 2;

pub fn check_title(field: &str, title: &str, errors: &mut ValidationErrors) {
    if title.trim().chars().count() < TITLE_MIN_LEN {
        errors.push(FieldError::new(
            field,
            format!("min={}", TITLE_MIN_LEN),
            title,
        ));
    }
}

pub fn parse_uuid(field: &str, raw: &str, errors: &mut ValidationErrors) -> Option<uuid::Uuid> {
    match uuid::Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(FieldError::new(field, "uuid", raw));
            None
        }
    }
}
