use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use crate::{
    entities::testimony::{NewTestimonyRequest, Testimony, TestimonyFilter, TestimonyStatus, UpdateTestimonyRequest},
    errors::AppError,
    repositories::testimony::TestimonyRepository,
    utils::valid_id::valid_id,
};

pub struct TestimonyHandler<R>
where
    R: TestimonyRepository,
{
    pub testimony_repo: R,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl<R> TestimonyHandler<R>
where
    R: TestimonyRepository,
{
    pub fn new(testimony_repo: R) -> Self {
        TestimonyHandler { testimony_repo }
    }

    /// Stores a visitor submission. It stays out of public reads until approved
    #[instrument(skip(self, request))]
    pub async fn submit_testimony(&self, request: NewTestimonyRequest) -> Result<Testimony, AppError> {
        let insert = request.prepare_for_insert(today())?;
        let testimony = self.testimony_repo.create_testimony(&insert).await?;

        info!(
            id = testimony.id,
            project_id = testimony.project_id,
            status = %testimony.status,
            "Testimony submitted"
        );
        Ok(testimony)
    }

    pub async fn get_testimony(&self, id: &str) -> Result<Testimony, AppError> {
        let id = valid_id(id)?;
        self.testimony_repo.get_testimony_by_id(id).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_testimony(&self, id: &str, request: UpdateTestimonyRequest) -> Result<Testimony, AppError> {
        let id = valid_id(id)?;
        let current = self.testimony_repo.get_testimony_by_id(id).await?;
        let insert = request.merge_into(current, today())?;

        self.testimony_repo.update_testimony(id, &insert).await
    }

    /// Moves a testimony to any status. Re-stamps `date_added`
    #[instrument(skip(self))]
    pub async fn moderate(&self, id: &str, status: TestimonyStatus) -> Result<Testimony, AppError> {
        let id = valid_id(id)?;
        let testimony = self.testimony_repo.set_testimony_status(id, status, today()).await?;

        info!(id, status = %status, "Testimony moderated");
        Ok(testimony)
    }

    /// Same as [`moderate`](Self::moderate) for a raw status code
    pub async fn moderate_code(&self, id: &str, code: i32) -> Result<Testimony, AppError> {
        let status = TestimonyStatus::try_from(code)?;
        self.moderate(id, status).await
    }

    #[instrument(skip(self))]
    pub async fn delete_testimony(&self, id: &str) -> Result<(), AppError> {
        let id = valid_id(id)?;
        self.testimony_repo.delete_testimony(id).await?;

        info!(id, "Testimony deleted");
        Ok(())
    }

    pub async fn list_testimonies(&self, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        self.testimony_repo.list_testimonies(filter).await
    }

    pub async fn list_live_testimonies(&self) -> Result<Vec<Testimony>, AppError> {
        self.testimony_repo.list_testimonies(TestimonyFilter::Live).await
    }

    pub async fn list_project_testimonies(&self, project_id: &str, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        let project_id = valid_id(project_id)?;
        self.testimony_repo.list_project_testimonies(project_id, filter).await
    }
}
