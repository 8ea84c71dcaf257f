use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, QueryBuilder};

use crate::{
    entities::project::{Project, ProjectInsert},
    errors::AppError,
    policy::{DeletePolicies, DeletePolicy},
    repositories::sqlx_repo::SqlxProjectRepo,
};

const PROJECT_COLUMNS: &str = r#"
    SELECT p.id, p.name, p.slug, p.url, p.pull_quote, p.short_description, p.description,
           p.start_date, p.end_date, p.category_id,
           ARRAY(
               SELECT ps.skill_id FROM project_skills ps
               WHERE ps.project_id = p.id
               ORDER BY ps.skill_id
           ) AS skill_ids
    FROM projects p
"#;

const PROJECT_ORDER: &str = " ORDER BY p.start_date DESC NULLS LAST, p.end_date DESC NULLS LAST, p.id ASC";

/// Which projects a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    Category(i64),
    Skill(i64),
}

impl ProjectScope {
    pub fn includes(&self, project: &Project) -> bool {
        match *self {
            ProjectScope::All => true,
            ProjectScope::Category(category_id) => project.category_id == category_id,
            ProjectScope::Skill(skill_id) => project.has_skill(skill_id),
        }
    }
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Inserts the project and its skill links in one transaction.
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError>;
    async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError>;
    async fn get_project_by_slug(&self, slug: &str) -> Result<Project, AppError>;

    /// Rewrites every column and replaces the skill set.
    async fn update_project(&self, id: i64, project: &ProjectInsert) -> Result<Project, AppError>;

    /// Honours the configured project delete policy. Returns the blob paths
    /// of cascaded attachments; releasing them is the caller's job.
    async fn delete_project(&self, id: i64) -> Result<Vec<String>, AppError>;

    /// Newest first, undated projects last.
    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, AppError>;

    /// Linking an already linked skill is a no-op.
    async fn add_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError>;
    async fn remove_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool, policies: DeletePolicies) -> Self {
        SqlxProjectRepo { pool, policies }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.constraint() {
            Some("projects_slug_key") => {
                return AppError::ConstraintViolation("Project slug already exists".into());
            }
            Some("projects_category_id_fkey") => {
                return AppError::ConstraintViolation("Project category does not exist".into());
            }
            Some("project_skills_skill_id_fkey") => {
                return AppError::ConstraintViolation("Linked skill does not exist".into());
            }
            Some("project_skills_project_id_fkey") => {
                return AppError::ConstraintViolation("Linked project does not exist".into());
            }
            _ => {}
        }
    }
    AppError::from(e)
}

async fn replace_project_skills(conn: &mut PgConnection, project_id: i64, skill_ids: &[i64]) -> Result<(), AppError> {
    sqlx::query("DELETE FROM project_skills WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    if !skill_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO project_skills (project_id, skill_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(skill_ids)
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;
    }

    Ok(())
}

/// Deletes `project_ids` inside the caller's transaction. Dependents are
/// removed or block the delete according to `policy`; skill links are always
/// removed. Returns the number of projects deleted and the blob paths of
/// the attachments that went with them.
pub(crate) async fn delete_projects(
    conn: &mut PgConnection,
    project_ids: &[i64],
    policy: DeletePolicy,
) -> Result<(u64, Vec<String>), AppError> {
    let mut blob_paths = Vec::new();

    match policy {
        DeletePolicy::Restrict => {
            let has_dependents: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS (SELECT 1 FROM project_attachments WHERE project_id = ANY($1))
                    OR EXISTS (SELECT 1 FROM testimonies WHERE project_id = ANY($1))
                "#,
            )
            .bind(project_ids)
            .fetch_one(&mut *conn)
            .await?;

            if has_dependents {
                return Err(AppError::ConstraintViolation(
                    "Project still has files, images or testimonies".into(),
                ));
            }
        }
        DeletePolicy::Cascade => {
            blob_paths = sqlx::query_scalar(
                "DELETE FROM project_attachments WHERE project_id = ANY($1) RETURNING path",
            )
            .bind(project_ids)
            .fetch_all(&mut *conn)
            .await?;

            sqlx::query("DELETE FROM testimonies WHERE project_id = ANY($1)")
                .bind(project_ids)
                .execute(&mut *conn)
                .await?;
        }
    }

    sqlx::query("DELETE FROM project_skills WHERE project_id = ANY($1)")
        .bind(project_ids)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM projects WHERE id = ANY($1)")
        .bind(project_ids)
        .execute(&mut *conn)
        .await?;

    Ok((result.rows_affected(), blob_paths))
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO projects (
                name, slug, url, pull_quote, short_description, description,
                start_date, end_date, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&project.name)
        .bind(&project.slug)
        .bind(&project.url)
        .bind(&project.pull_quote)
        .bind(&project.short_description)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let skill_ids: Vec<i64> = project.skill_ids.iter().copied().collect();
        replace_project_skills(&mut *tx, id, &skill_ids).await?;

        tx.commit().await?;
        self.get_project_by_id(id).await
    }

    async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError> {
        let mut builder = QueryBuilder::new(PROJECT_COLUMNS);
        builder.push(" WHERE p.id = ").push_bind(id);

        builder
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
    }

    async fn get_project_by_slug(&self, slug: &str) -> Result<Project, AppError> {
        let mut builder = QueryBuilder::new(PROJECT_COLUMNS);
        builder.push(" WHERE p.slug = ").push_bind(slug);

        builder
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", slug)))
    }

    async fn update_project(&self, id: i64, project: &ProjectInsert) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE projects SET
                name = $1,
                slug = $2,
                url = $3,
                pull_quote = $4,
                short_description = $5,
                description = $6,
                start_date = $7,
                end_date = $8,
                category_id = $9
            WHERE id = $10
            "#,
        )
        .bind(&project.name)
        .bind(&project.slug)
        .bind(&project.url)
        .bind(&project.pull_quote)
        .bind(&project.short_description)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.category_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        let skill_ids: Vec<i64> = project.skill_ids.iter().copied().collect();
        replace_project_skills(&mut *tx, id, &skill_ids).await?;

        tx.commit().await?;
        self.get_project_by_id(id).await
    }

    async fn delete_project(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let (deleted, blob_paths) = delete_projects(&mut *tx, &[id], self.policies.project).await?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }

        tx.commit().await?;
        Ok(blob_paths)
    }

    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, AppError> {
        let mut builder = QueryBuilder::new(PROJECT_COLUMNS);

        match scope {
            ProjectScope::All => {}
            ProjectScope::Category(category_id) => {
                builder.push(" WHERE p.category_id = ").push_bind(category_id);
            }
            ProjectScope::Skill(skill_id) => {
                builder
                    .push(" WHERE EXISTS (SELECT 1 FROM project_skills f WHERE f.project_id = p.id AND f.skill_id = ")
                    .push_bind(skill_id)
                    .push(")");
            }
        }

        builder.push(PROJECT_ORDER);

        let projects = builder
            .build_query_as::<Project>()
            .fetch_all(&self.pool)
            .await?;

        Ok(projects)
    }

    async fn add_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO project_skills (project_id, skill_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(skill_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn remove_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM project_skills WHERE project_id = $1 AND skill_id = $2")
            .bind(project_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
