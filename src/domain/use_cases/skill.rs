use tracing::{info, instrument};

use crate::{
    entities::skill::{NewSkillRequest, Skill, SkillInsert, UpdateSkillRequest},
    errors::AppError,
    repositories::skill::SkillRepository,
    utils::valid_id::valid_id,
};

pub struct SkillHandler<R>
where
    R: SkillRepository,
{
    pub skill_repo: R,
}

impl<R> SkillHandler<R>
where
    R: SkillRepository,
{
    pub fn new(skill_repo: R) -> Self {
        SkillHandler { skill_repo }
    }

    #[instrument(skip(self, request))]
    pub async fn create_skill(&self, request: NewSkillRequest) -> Result<Skill, AppError> {
        let insert = SkillInsert::try_from(request)?;
        let skill = self.skill_repo.create_skill(&insert).await?;

        info!(id = skill.id, slug = %skill.slug, "Skill created");
        Ok(skill)
    }

    pub async fn get_skill(&self, id: &str) -> Result<Skill, AppError> {
        let id = valid_id(id)?;
        self.skill_repo.get_skill_by_id(id).await
    }

    pub async fn get_skill_by_slug(&self, slug: &str) -> Result<Skill, AppError> {
        self.skill_repo.get_skill_by_slug(slug).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_skill(&self, id: &str, request: UpdateSkillRequest) -> Result<Skill, AppError> {
        let id = valid_id(id)?;
        let current = self.skill_repo.get_skill_by_id(id).await?;
        let insert = request.merge_into(current)?;

        self.skill_repo.update_skill(id, &insert).await
    }

    /// Deletes the skill and unlinks it from every project
    #[instrument(skip(self))]
    pub async fn delete_skill(&self, id: &str) -> Result<(), AppError> {
        let id = valid_id(id)?;
        self.skill_repo.delete_skill(id).await?;

        info!(id, "Skill deleted");
        Ok(())
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>, AppError> {
        self.skill_repo.list_skills().await
    }
}
