mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod shared_repos;

pub use domain::{entities, policy, use_cases, validators};
pub use interfaces::repositories;
pub use infrastructure::{db, storage, utils};

use repositories::sqlx_repo::{
    SqlxAttachmentRepo, SqlxCategoryRepo, SqlxProjectRepo, SqlxSkillRepo, SqlxTestimonyRepo,
};
use shared_repos::SharedRepositories;
use storage::blob::SharedBlobStorage;
use use_cases::{
    attachment::AttachmentHandler, category::CategoryHandler, project::ProjectHandler,
    skill::SkillHandler, testimony::TestimonyHandler,
};

pub type AppCategoryHandler = CategoryHandler<SqlxCategoryRepo>;
pub type AppSkillHandler = SkillHandler<SqlxSkillRepo>;
pub type AppProjectHandler = ProjectHandler<
    SqlxProjectRepo,
    SqlxCategoryRepo,
    SqlxSkillRepo,
    SqlxAttachmentRepo,
    SqlxTestimonyRepo,
>;
pub type AppAttachmentHandler = AttachmentHandler<SqlxAttachmentRepo>;
pub type AppTestimonyHandler = TestimonyHandler<SqlxTestimonyRepo>;

pub struct AppState {
    pub category_handler: AppCategoryHandler,
    pub skill_handler: AppSkillHandler,
    pub project_handler: AppProjectHandler,
    pub attachment_handler: AppAttachmentHandler,
    pub testimony_handler: AppTestimonyHandler,
    pub repos: SharedRepositories,
}

impl AppState {
    /// The blob backend is supplied by the embedder.
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool, storage: SharedBlobStorage) -> Self {
        let repos = SharedRepositories::new(pool, config.delete_policies());

        AppState {
            category_handler: CategoryHandler::new(repos.category_repo.clone(), storage.clone()),
            skill_handler: SkillHandler::new(repos.skill_repo.clone()),
            project_handler: ProjectHandler::new(
                repos.project_repo.clone(),
                repos.category_repo.clone(),
                repos.skill_repo.clone(),
                repos.attachment_repo.clone(),
                repos.testimony_repo.clone(),
                storage.clone(),
            ),
            attachment_handler: AttachmentHandler::new(repos.attachment_repo.clone(), storage),
            testimony_handler: TestimonyHandler::new(repos.testimony_repo.clone()),
            repos,
        }
    }
}
