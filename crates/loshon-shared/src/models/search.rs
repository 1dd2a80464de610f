use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened read model pushed to the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchObject {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
