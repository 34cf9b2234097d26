//! PostgreSQL implementation of the attachment metadata repository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use affix_core::{Attachment, AttachmentRepository, CreateAttachmentRequest, Error, Result};

/// PostgreSQL attachment repository.
///
/// Identifiers come from the `attachment` table's bigserial sequence, so a
/// row insert is also the identifier reservation the store relies on.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn insert(&self, req: CreateAttachmentRequest) -> Result<Attachment> {
        let row = sqlx::query(
            r#"INSERT INTO attachment (page_id, name, content_type, size_bytes)
               VALUES ($1, $2, $3, 0)
               RETURNING id, page_id, name, content_type, size_bytes, created_at"#,
        )
        .bind(req.page_id)
        .bind(&req.name)
        .bind(&req.content_type)
        .fetch_one(&self.pool)
        .await?;

        let attachment = attachment_from_row(&row);
        debug!(
            subsystem = "db",
            component = "attachments",
            op = "insert",
            attachment_id = attachment.id,
            page_id = attachment.page_id,
            "Attachment record created"
        );
        Ok(attachment)
    }

    async fn find(&self, id: i64) -> Result<Attachment> {
        let row = sqlx::query(
            r#"SELECT id, page_id, name, content_type, size_bytes, created_at
               FROM attachment
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttachmentNotFound(id))?;

        Ok(attachment_from_row(&row))
    }

    async fn list_by_page(&self, page_id: i64) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(
            r#"SELECT id, page_id, name, content_type, size_bytes, created_at
               FROM attachment
               WHERE page_id = $1
               ORDER BY created_at, id"#,
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(attachment_from_row).collect())
    }

    async fn set_size(&self, id: i64, size_bytes: i64) -> Result<()> {
        let result = sqlx::query("UPDATE attachment SET size_bytes = $2 WHERE id = $1")
            .bind(id)
            .bind(size_bytes)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::AttachmentNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM attachment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::AttachmentNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM attachment WHERE id = $1) AS present")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("present"))
    }
}

/// Convert a database row to an Attachment.
fn attachment_from_row(row: &sqlx::postgres::PgRow) -> Attachment {
    Attachment {
        id: row.get("id"),
        page_id: row.get("page_id"),
        name: row.get("name"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        created_at: row.get("created_at"),
    }
}
