use tracing::{info, instrument};

use crate::{
    entities::{
        attachment::AttachmentKind,
        project::{NewProjectRequest, Project, ProjectDetail, ProjectInsert, UpdateProjectRequest},
        skill::Skill,
        testimony::TestimonyFilter,
    },
    errors::AppError,
    repositories::{
        attachment::AttachmentRepository,
        category::CategoryRepository,
        project::{ProjectRepository, ProjectScope},
        skill::SkillRepository,
        testimony::TestimonyRepository,
    },
    storage::blob::{release_blobs, SharedBlobStorage},
    utils::valid_id::valid_id,
};

/// Project administration plus the public project reads. The detail read
/// needs every related record kind, hence one repository per kind; the blob
/// store is for attachments removed by a cascading delete.
pub struct ProjectHandler<P, C, S, A, T>
where
    P: ProjectRepository,
    C: CategoryRepository,
    S: SkillRepository,
    A: AttachmentRepository,
    T: TestimonyRepository,
{
    pub project_repo: P,
    pub category_repo: C,
    pub skill_repo: S,
    pub attachment_repo: A,
    pub testimony_repo: T,
    pub storage: SharedBlobStorage,
}

impl<P, C, S, A, T> ProjectHandler<P, C, S, A, T>
where
    P: ProjectRepository,
    C: CategoryRepository,
    S: SkillRepository,
    A: AttachmentRepository,
    T: TestimonyRepository,
{
    pub fn new(
        project_repo: P,
        category_repo: C,
        skill_repo: S,
        attachment_repo: A,
        testimony_repo: T,
        storage: SharedBlobStorage,
    ) -> Self {
        ProjectHandler {
            project_repo,
            category_repo,
            skill_repo,
            attachment_repo,
            testimony_repo,
            storage,
        }
    }

    /// Creates a project together with its skill links
    #[instrument(skip(self, request))]
    pub async fn create_project(&self, request: NewProjectRequest) -> Result<Project, AppError> {
        let insert = ProjectInsert::try_from(request)?;
        let project = self.project_repo.create_project(&insert).await?;

        info!(id = project.id, slug = %project.slug, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, AppError> {
        let id = valid_id(id)?;
        self.project_repo.get_project_by_id(id).await
    }

    pub async fn get_project_by_slug(&self, slug: &str) -> Result<Project, AppError> {
        self.project_repo.get_project_by_slug(slug).await
    }

    /// Applies a partial update. A supplied skill list replaces the current set
    #[instrument(skip(self, request))]
    pub async fn update_project(&self, id: &str, request: UpdateProjectRequest) -> Result<Project, AppError> {
        let id = valid_id(id)?;
        let current = self.project_repo.get_project_by_id(id).await?;
        let insert = request.merge_into(current)?;

        self.project_repo.update_project(id, &insert).await
    }

    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let id = valid_id(id)?;
        let blob_paths = self.project_repo.delete_project(id).await?;
        release_blobs(self.storage.as_ref(), &blob_paths).await;

        info!(id, released_blobs = blob_paths.len(), "Project deleted");
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_projects(ProjectScope::All).await
    }

    pub async fn list_projects_in(&self, scope: ProjectScope) -> Result<Vec<Project>, AppError> {
        self.project_repo.list_projects(scope).await
    }

    pub async fn list_projects_by_category(&self, category_slug: &str) -> Result<Vec<Project>, AppError> {
        let category = self.category_repo.get_category_by_slug(category_slug).await?;
        self.project_repo.list_projects(ProjectScope::Category(category.id)).await
    }

    pub async fn list_projects_by_skill(&self, skill_slug: &str) -> Result<Vec<Project>, AppError> {
        let skill = self.skill_repo.get_skill_by_slug(skill_slug).await?;
        self.project_repo.list_projects(ProjectScope::Skill(skill.id)).await
    }

    #[instrument(skip(self))]
    pub async fn add_skill(&self, project_id: &str, skill_id: &str) -> Result<Project, AppError> {
        let project_id = valid_id(project_id)?;
        let skill_id = valid_id(skill_id)?;

        self.project_repo.add_project_skill(project_id, skill_id).await?;
        self.project_repo.get_project_by_id(project_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_skill(&self, project_id: &str, skill_id: &str) -> Result<Project, AppError> {
        let project_id = valid_id(project_id)?;
        let skill_id = valid_id(skill_id)?;

        let project = self.project_repo.get_project_by_id(project_id).await?;
        if !project.has_skill(skill_id) {
            return Ok(project);
        }

        self.project_repo.remove_project_skill(project_id, skill_id).await?;
        self.project_repo.get_project_by_id(project_id).await
    }

    pub async fn list_project_skills(&self, project_id: &str) -> Result<Vec<Skill>, AppError> {
        let project_id = valid_id(project_id)?;
        self.project_repo.get_project_by_id(project_id).await?;
        self.skill_repo.list_project_skills(project_id).await
    }

    /// Everything a project page shows. Testimonies are restricted to live ones
    pub async fn get_project_detail(&self, slug: &str) -> Result<ProjectDetail, AppError> {
        let project = self.project_repo.get_project_by_slug(slug).await?;

        let category = self.category_repo.get_category_by_id(project.category_id).await?;
        let skills = self.skill_repo.list_project_skills(project.id).await?;
        let files = self.attachment_repo
            .list_project_attachments(AttachmentKind::File, project.id)
            .await?;
        let images = self.attachment_repo
            .list_project_attachments(AttachmentKind::Image, project.id)
            .await?;
        let testimonies = self.testimony_repo
            .list_project_testimonies(project.id, TestimonyFilter::Live)
            .await?;

        Ok(ProjectDetail {
            project,
            category,
            skills,
            files,
            images,
            testimonies,
        })
    }
}
