use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    entities::attachment::{Attachment, AttachmentInsert, AttachmentKind},
    errors::AppError,
    repositories::sqlx_repo::SqlxAttachmentRepo,
};

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create_attachment(&self, attachment: &AttachmentInsert) -> Result<Attachment, AppError>;
    async fn get_attachment_by_id(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError>;
    async fn update_attachment_desc(&self, kind: AttachmentKind, id: i64, desc: &str) -> Result<Attachment, AppError>;

    /// Returns the deleted record so the caller can release its blob.
    async fn delete_attachment(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError>;

    /// Ascending id.
    async fn list_attachments(&self, kind: AttachmentKind) -> Result<Vec<Attachment>, AppError>;
    async fn list_project_attachments(&self, kind: AttachmentKind, project_id: i64) -> Result<Vec<Attachment>, AppError>;
}

impl SqlxAttachmentRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxAttachmentRepo { pool }
    }
}

fn not_found(kind: AttachmentKind, id: i64) -> AppError {
    AppError::NotFound(format!("Project {} {} not found", kind, id))
}

#[async_trait]
impl AttachmentRepository for SqlxAttachmentRepo {
    async fn create_attachment(&self, attachment: &AttachmentInsert) -> Result<Attachment, AppError> {
        let created = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO project_attachments (project_id, kind, path, original_name, "desc")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, kind, path, original_name, "desc"
            "#,
        )
        .bind(attachment.project_id)
        .bind(attachment.kind)
        .bind(&attachment.path)
        .bind(&attachment.original_name)
        .bind(&attachment.desc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("project_attachments_project_id_fkey") {
                    return AppError::ConstraintViolation("Attachment project does not exist".into());
                }
            }
            AppError::from(e)
        })?;

        Ok(created)
    }

    async fn get_attachment_by_id(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError> {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, project_id, kind, path, original_name, "desc"
            FROM project_attachments
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(kind, id))
    }

    async fn update_attachment_desc(&self, kind: AttachmentKind, id: i64, desc: &str) -> Result<Attachment, AppError> {
        sqlx::query_as::<_, Attachment>(
            r#"
            UPDATE project_attachments SET "desc" = $1
            WHERE id = $2 AND kind = $3
            RETURNING id, project_id, kind, path, original_name, "desc"
            "#,
        )
        .bind(desc)
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(kind, id))
    }

    async fn delete_attachment(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError> {
        sqlx::query_as::<_, Attachment>(
            r#"
            DELETE FROM project_attachments
            WHERE id = $1 AND kind = $2
            RETURNING id, project_id, kind, path, original_name, "desc"
            "#,
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(kind, id))
    }

    async fn list_attachments(&self, kind: AttachmentKind) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, project_id, kind, path, original_name, "desc"
            FROM project_attachments
            WHERE kind = $1
            ORDER BY id ASC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    async fn list_project_attachments(&self, kind: AttachmentKind, project_id: i64) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, project_id, kind, path, original_name, "desc"
            FROM project_attachments
            WHERE kind = $1 AND project_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(kind)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }
}
