use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loshon_shared::Document;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::DbPool;

use super::{
    ascend_restore, reload_with_children, DeletedScope, DocumentFilter, DocumentRepository,
    ParentFilter, RepoError,
};

const COLUMNS: &str = "id, title, user_id, is_archived, is_published, parent_document_id, \
     content, md_content, cover_image, icon, created_at, updated_at, deleted_at";

/// Subtree closure of `$1`, including `$1` itself. `UNION` rather than
/// `UNION ALL` so a corrupt parent cycle terminates.
const SUBTREE_CTE: &str = r#"
    WITH RECURSIVE subtree AS (
        SELECT id FROM documents WHERE id = $1
        UNION
        SELECT child.id
        FROM documents child
        JOIN subtree ON child.parent_document_id = subtree.id
        WHERE child.deleted_at IS NULL
    )
"#;

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    user_id: String,
    is_archived: bool,
    is_published: bool,
    parent_document_id: Option<Uuid>,
    content: Option<String>,
    md_content: Option<String>,
    cover_image: Option<String>,
    icon: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

fn row_to_document(row: DocumentRow) -> Document {
    Document {
        id: row.id,
        title: row.title,
        owner_id: row.user_id,
        is_archived: row.is_archived,
        is_published: row.is_published,
        parent_id: row.parent_document_id,
        content: row.content,
        md_content: row.md_content,
        cover_image: row.cover_image,
        icon: row.icon,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        children: Vec::new(),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
    builder.push(" WHERE TRUE");

    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(owner_id) = &filter.owner_id {
        builder.push(" AND user_id = ").push_bind(owner_id.clone());
    }
    match filter.parent {
        Some(ParentFilter::Root) => {
            builder.push(" AND parent_document_id IS NULL");
        }
        Some(ParentFilter::ChildOf(parent_id)) => {
            builder.push(" AND parent_document_id = ").push_bind(parent_id);
        }
        None => {}
    }
    if let Some(is_archived) = filter.is_archived {
        builder.push(" AND is_archived = ").push_bind(is_archived);
    }
    match filter.deleted {
        DeletedScope::Exclude => {
            builder.push(" AND deleted_at IS NULL");
        }
        DeletedScope::Only => {
            builder.push(" AND deleted_at IS NOT NULL");
        }
        DeletedScope::Include => {}
    }
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: DbPool,
}

impl PgDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs `set_clause` over the subtree closure of `root` as one statement.
    async fn cascade(&self, root: Uuid, set_clause: &str) -> Result<u64, RepoError> {
        let statement = format!(
            r#"
            {SUBTREE_CTE}
            UPDATE documents d
            SET {set_clause}, updated_at = GREATEST(NOW(), d.updated_at)
            FROM subtree
            WHERE d.id = subtree.id
            "#
        );

        let result = sqlx::query(&statement).bind(root).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn save(&self, doc: Document) -> Result<Document, RepoError> {
        let statement = format!(
            r#"
            INSERT INTO documents (id, title, user_id, is_archived, is_published,
                                   parent_document_id, content, md_content, cover_image, icon,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                is_archived = documents.is_archived OR EXCLUDED.is_archived,
                is_published = EXCLUDED.is_published,
                parent_document_id = EXCLUDED.parent_document_id,
                content = EXCLUDED.content,
                md_content = EXCLUDED.md_content,
                cover_image = EXCLUDED.cover_image,
                icon = EXCLUDED.icon,
                updated_at = GREATEST(NOW(), documents.updated_at)
            RETURNING {COLUMNS}
            "#
        );

        let row: DocumentRow = sqlx::query_as(&statement)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.owner_id)
            .bind(doc.is_archived)
            .bind(doc.is_published)
            .bind(doc.parent_id)
            .bind(&doc.content)
            .bind(&doc.md_content)
            .bind(&doc.cover_image)
            .bind(&doc.icon)
            .fetch_one(&self.pool)
            .await?;

        Ok(row_to_document(row))
    }

    async fn unarchive(&self, id: Uuid) -> Result<Document, RepoError> {
        let statement = format!(
            r#"
            UPDATE documents
            SET is_archived = FALSE, updated_at = GREATEST(NOW(), updated_at)
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        );

        let row: Option<DocumentRow> = sqlx::query_as(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_document).ok_or(RepoError::NotFound)
    }

    async fn first(&self, filter: &DocumentFilter) -> Result<Document, RepoError> {
        let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM documents"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at ASC LIMIT 1");

        let row: Option<DocumentRow> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_document).ok_or(RepoError::NotFound)
    }

    async fn get(&self, filter: &DocumentFilter) -> Result<Vec<Document>, RepoError> {
        let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM documents"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at ASC, id ASC");

        let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(row_to_document).collect())
    }

    async fn archive(&self, doc: Document) -> Result<Document, RepoError> {
        let affected = self.cascade(doc.id, "is_archived = TRUE").await?;
        if affected == 0 {
            return Err(RepoError::NotFound);
        }
        tracing::debug!(document_id = %doc.id, affected, "archived subtree");

        let mut fallback = doc;
        fallback.is_archived = true;
        Ok(reload_with_children(self, fallback, DeletedScope::Exclude).await)
    }

    async fn restore(&self, doc: Document) -> Result<Document, RepoError> {
        ascend_restore(self, doc).await
    }

    async fn delete(&self, doc: Document) -> Result<Document, RepoError> {
        let affected = self
            .cascade(doc.id, "deleted_at = COALESCE(d.deleted_at, NOW())")
            .await?;
        if affected == 0 {
            return Err(RepoError::NotFound);
        }
        tracing::debug!(document_id = %doc.id, affected, "deleted subtree");

        let mut fallback = doc;
        fallback.deleted_at.get_or_insert_with(Utc::now);
        Ok(reload_with_children(self, fallback, DeletedScope::Include).await)
    }
}
