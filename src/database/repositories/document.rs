//! Document repository implementation

use chrono::Utc;
use sqlx::PgPool;

use crate::models::document::{CreateDocumentRequest, Document, DocumentStatus};
use crate::utils::errors::AscesaError;

const DOCUMENT_COLUMNS: &str =
    "id, user_id, title, file_name, stored_name, mime_type, size_bytes, status, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an uploaded document
    pub async fn create(&self, request: CreateDocumentRequest) -> Result<Document, AscesaError> {
        let now = Utc::now();
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (user_id, title, file_name, stored_name, mime_type, size_bytes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.title)
        .bind(request.file_name)
        .bind(request.stored_name)
        .bind(request.mime_type)
        .bind(request.size_bytes)
        .bind(DocumentStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    /// Find document by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Document>, AscesaError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Set review status
    pub async fn set_status(&self, id: i64, status: DocumentStatus) -> Result<Option<Document>, AscesaError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Delete document record
    pub async fn delete(&self, id: i64) -> Result<bool, AscesaError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List documents, restricted to one owner when `user_id` is set
    pub async fn list(&self, user_id: Option<i64>, limit: i64, offset: i64) -> Result<Vec<Document>, AscesaError> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// Count documents matching the same filter as `list`
    pub async fn count(&self, user_id: Option<i64>) -> Result<i64, AscesaError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM documents WHERE ($1::BIGINT IS NULL OR user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }
}
