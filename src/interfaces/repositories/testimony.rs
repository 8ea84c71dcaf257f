use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

use crate::{
    entities::testimony::{Testimony, TestimonyFilter, TestimonyInsert, TestimonyStatus},
    errors::AppError,
    repositories::sqlx_repo::SqlxTestimonyRepo,
};

const TESTIMONY_COLUMNS: &str =
    "SELECT id, project_id, name, from_url, from_company, statement, status, date_added FROM testimonies";

#[async_trait]
pub trait TestimonyRepository: Send + Sync {
    async fn create_testimony(&self, testimony: &TestimonyInsert) -> Result<Testimony, AppError>;
    async fn get_testimony_by_id(&self, id: i64) -> Result<Testimony, AppError>;
    async fn update_testimony(&self, id: i64, testimony: &TestimonyInsert) -> Result<Testimony, AppError>;

    /// Moves a testimony to `status`; any transition is allowed.
    async fn set_testimony_status(
        &self,
        id: i64,
        status: TestimonyStatus,
        date_added: chrono::NaiveDate,
    ) -> Result<Testimony, AppError>;

    async fn delete_testimony(&self, id: i64) -> Result<(), AppError>;

    /// Ascending id, restricted by `filter`.
    async fn list_testimonies(&self, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError>;
    async fn list_project_testimonies(&self, project_id: i64, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError>;
}

impl SqlxTestimonyRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxTestimonyRepo { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("testimonies_project_id_fkey") {
            return AppError::ConstraintViolation("Testimony project does not exist".into());
        }
    }
    AppError::from(e)
}

impl SqlxTestimonyRepo {
    async fn fetch_filtered(&self, project_id: Option<i64>, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        let mut builder = QueryBuilder::new(TESTIMONY_COLUMNS);
        builder.push(" WHERE TRUE");

        if let Some(project_id) = project_id {
            builder.push(" AND project_id = ").push_bind(project_id);
        }

        if let Some(status) = filter.required_status() {
            builder.push(" AND status = ").push_bind(status);
        }

        builder.push(" ORDER BY id ASC");

        let testimonies = builder
            .build_query_as::<Testimony>()
            .fetch_all(&self.pool)
            .await?;

        Ok(testimonies)
    }
}

#[async_trait]
impl TestimonyRepository for SqlxTestimonyRepo {
    async fn create_testimony(&self, testimony: &TestimonyInsert) -> Result<Testimony, AppError> {
        let created = sqlx::query_as::<_, Testimony>(
            r#"
            INSERT INTO testimonies (project_id, name, from_url, from_company, statement, status, date_added)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, project_id, name, from_url, from_company, statement, status, date_added
            "#,
        )
        .bind(testimony.project_id)
        .bind(&testimony.name)
        .bind(&testimony.from_url)
        .bind(&testimony.from_company)
        .bind(&testimony.statement)
        .bind(testimony.status)
        .bind(testimony.date_added)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(created)
    }

    async fn get_testimony_by_id(&self, id: i64) -> Result<Testimony, AppError> {
        let mut builder = QueryBuilder::new(TESTIMONY_COLUMNS);
        builder.push(" WHERE id = ").push_bind(id);

        builder
            .build_query_as::<Testimony>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))
    }

    async fn update_testimony(&self, id: i64, testimony: &TestimonyInsert) -> Result<Testimony, AppError> {
        sqlx::query_as::<_, Testimony>(
            r#"
            UPDATE testimonies SET
                project_id = $1,
                name = $2,
                from_url = $3,
                from_company = $4,
                statement = $5,
                status = $6,
                date_added = $7
            WHERE id = $8
            RETURNING id, project_id, name, from_url, from_company, statement, status, date_added
            "#,
        )
        .bind(testimony.project_id)
        .bind(&testimony.name)
        .bind(&testimony.from_url)
        .bind(&testimony.from_company)
        .bind(&testimony.statement)
        .bind(testimony.status)
        .bind(testimony.date_added)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))
    }

    async fn set_testimony_status(
        &self,
        id: i64,
        status: TestimonyStatus,
        date_added: chrono::NaiveDate,
    ) -> Result<Testimony, AppError> {
        sqlx::query_as::<_, Testimony>(
            r#"
            UPDATE testimonies SET status = $1, date_added = $2
            WHERE id = $3
            RETURNING id, project_id, name, from_url, from_company, statement, status, date_added
            "#,
        )
        .bind(status)
        .bind(date_added)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))
    }

    async fn delete_testimony(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM testimonies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Testimony {} not found", id)));
        }

        Ok(())
    }

    async fn list_testimonies(&self, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        self.fetch_filtered(None, filter).await
    }

    async fn list_project_testimonies(&self, project_id: i64, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        self.fetch_filtered(Some(project_id), filter).await
    }
}
