use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    entities::category::{Category, CategoryInsert},
    errors::AppError,
    policy::{DeletePolicies, DeletePolicy},
    repositories::{project::delete_projects, sqlx_repo::SqlxCategoryRepo},
};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError>;
    async fn get_category_by_id(&self, id: i64) -> Result<Category, AppError>;
    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, AppError>;
    async fn update_category(&self, id: i64, category: &CategoryInsert) -> Result<Category, AppError>;

    /// Honours the configured category delete policy. Returns the blob paths
    /// of attachments removed by a cascade.
    async fn delete_category(&self, id: i64) -> Result<Vec<String>, AppError>;

    /// Position ascending, then slug.
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
}

impl SqlxCategoryRepo {
    pub fn new(pool: PgPool, policies: DeletePolicies) -> Self {
        SqlxCategoryRepo { pool, policies }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("categories_slug_key") {
            return AppError::ConstraintViolation("Category slug already exists".into());
        }
    }
    AppError::from(e)
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepo {
    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, position)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, position
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.position)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(created)
    }

    async fn get_category_by_id(&self, id: i64) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug, position FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug, position FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn update_category(&self, id: i64, category: &CategoryInsert) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $1,
                slug = $2,
                position = $3
            WHERE id = $4
            RETURNING id, name, slug, position
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.position)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn delete_category(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut blob_paths = Vec::new();

        let project_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM projects WHERE category_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        if !project_ids.is_empty() {
            match self.policies.category {
                DeletePolicy::Restrict => {
                    return Err(AppError::ConstraintViolation(format!(
                        "Category {} still has {} project(s)",
                        id,
                        project_ids.len()
                    )));
                }
                DeletePolicy::Cascade => {
                    (_, blob_paths) = delete_projects(&mut *tx, &project_ids, self.policies.project).await?;
                }
            }
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tx.commit().await?;
        Ok(blob_paths)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, position FROM categories ORDER BY position ASC, slug ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}
