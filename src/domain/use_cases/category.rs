use tracing::{info, instrument};

use crate::{
    entities::category::{Category, CategoryInsert, NewCategoryRequest, UpdateCategoryRequest},
    errors::AppError,
    repositories::category::CategoryRepository,
    storage::blob::{release_blobs, SharedBlobStorage},
    utils::valid_id::valid_id,
};

/// Category administration. Holds the blob store because a cascading delete
/// can take project files and images with it.
pub struct CategoryHandler<R>
where
    R: CategoryRepository,
{
    pub category_repo: R,
    pub storage: SharedBlobStorage,
}

impl<R> CategoryHandler<R>
where
    R: CategoryRepository,
{
    pub fn new(category_repo: R, storage: SharedBlobStorage) -> Self {
        CategoryHandler { category_repo, storage }
    }

    /// Creates a category, deriving the slug from the name when none is given
    #[instrument(skip(self, request))]
    pub async fn create_category(&self, request: NewCategoryRequest) -> Result<Category, AppError> {
        let insert = CategoryInsert::try_from(request)?;
        let category = self.category_repo.create_category(&insert).await?;

        info!(id = category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, AppError> {
        let id = valid_id(id)?;
        self.category_repo.get_category_by_id(id).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, AppError> {
        self.category_repo.get_category_by_slug(slug).await
    }

    /// Applies a partial update; omitted fields keep their stored values
    #[instrument(skip(self, request))]
    pub async fn update_category(&self, id: &str, request: UpdateCategoryRequest) -> Result<Category, AppError> {
        let id = valid_id(id)?;
        let current = self.category_repo.get_category_by_id(id).await?;
        let insert = request.merge_into(current)?;

        self.category_repo.update_category(id, &insert).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let id = valid_id(id)?;
        let blob_paths = self.category_repo.delete_category(id).await?;
        release_blobs(self.storage.as_ref(), &blob_paths).await;

        info!(id, released_blobs = blob_paths.len(), "Category deleted");
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.list_categories().await
    }
}
