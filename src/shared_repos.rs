use crate::{
    policy::DeletePolicies,
    repositories::sqlx_repo::{
        SqlxAttachmentRepo, SqlxCategoryRepo, SqlxProjectRepo, SqlxSkillRepo, SqlxTestimonyRepo,
    },
};

#[derive(Clone)]
pub struct SharedRepositories {
    pub category_repo: SqlxCategoryRepo,
    pub skill_repo: SqlxSkillRepo,
    pub project_repo: SqlxProjectRepo,
    pub attachment_repo: SqlxAttachmentRepo,
    pub testimony_repo: SqlxTestimonyRepo,
}

impl SharedRepositories {
    pub fn new(pool: sqlx::PgPool, policies: DeletePolicies) -> Self {
        let category_repo = SqlxCategoryRepo::new(pool.clone(), policies);
        let skill_repo = SqlxSkillRepo::new(pool.clone());
        let project_repo = SqlxProjectRepo::new(pool.clone(), policies);
        let attachment_repo = SqlxAttachmentRepo::new(pool.clone());
        let testimony_repo = SqlxTestimonyRepo::new(pool);

        SharedRepositories {
            category_repo,
            skill_repo,
            project_repo,
            attachment_repo,
            testimony_repo,
        }
    }
}
