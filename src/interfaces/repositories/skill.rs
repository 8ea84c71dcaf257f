use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    entities::skill::{Skill, SkillInsert},
    errors::AppError,
    repositories::sqlx_repo::SqlxSkillRepo,
};

#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn create_skill(&self, skill: &SkillInsert) -> Result<Skill, AppError>;
    async fn get_skill_by_id(&self, id: i64) -> Result<Skill, AppError>;
    async fn get_skill_by_slug(&self, slug: &str) -> Result<Skill, AppError>;
    async fn update_skill(&self, id: i64, skill: &SkillInsert) -> Result<Skill, AppError>;

    /// Also unlinks the skill from every project.
    async fn delete_skill(&self, id: i64) -> Result<(), AppError>;

    /// Alphabetical by name.
    async fn list_skills(&self) -> Result<Vec<Skill>, AppError>;

    /// Skills linked to a project, alphabetical by name.
    async fn list_project_skills(&self, project_id: i64) -> Result<Vec<Skill>, AppError>;
}

impl SqlxSkillRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxSkillRepo { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.constraint() == Some("skills_slug_key") {
            return AppError::ConstraintViolation("Skill slug already exists".into());
        }
    }
    AppError::from(e)
}

#[async_trait]
impl SkillRepository for SqlxSkillRepo {
    async fn create_skill(&self, skill: &SkillInsert) -> Result<Skill, AppError> {
        let created = sqlx::query_as::<_, Skill>(
            "INSERT INTO skills (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(&skill.name)
        .bind(&skill.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(created)
    }

    async fn get_skill_by_id(&self, id: i64) -> Result<Skill, AppError> {
        sqlx::query_as::<_, Skill>("SELECT id, name, slug FROM skills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", id)))
    }

    async fn get_skill_by_slug(&self, slug: &str) -> Result<Skill, AppError> {
        sqlx::query_as::<_, Skill>("SELECT id, name, slug FROM skills WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Skill '{}' not found", slug)))
    }

    async fn update_skill(&self, id: i64, skill: &SkillInsert) -> Result<Skill, AppError> {
        sqlx::query_as::<_, Skill>(
            "UPDATE skills SET name = $1, slug = $2 WHERE id = $3 RETURNING id, name, slug",
        )
        .bind(&skill.name)
        .bind(&skill.slug)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", id)))
    }

    async fn delete_skill(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM project_skills WHERE skill_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Skill {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, AppError> {
        let skills = sqlx::query_as::<_, Skill>("SELECT id, name, slug FROM skills ORDER BY name ASC, slug ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(skills)
    }

    async fn list_project_skills(&self, project_id: i64) -> Result<Vec<Skill>, AppError> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT s.id, s.name, s.slug
            FROM skills s
            JOIN project_skills ps ON ps.skill_id = s.id
            WHERE ps.project_id = $1
            ORDER BY s.name ASC, s.slug ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(skills)
    }
}
