pub mod api;
pub mod models;
pub mod patch;
pub mod validation;

pub use models::*;
pub use patch::Patch;
pub use validation::{FieldError, ValidationErrors};
