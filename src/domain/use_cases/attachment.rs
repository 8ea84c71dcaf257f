use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    entities::attachment::{Attachment, AttachmentInsert, AttachmentKind, NewAttachmentRequest, UpdateAttachmentRequest},
    errors::AppError,
    repositories::attachment::AttachmentRepository,
    storage::blob::{release_blobs, upload_path, SharedBlobStorage},
    utils::valid_id::valid_id,
};

/// Project files and images. Bytes go to the blob store, the record keeps
/// the returned path.
pub struct AttachmentHandler<R>
where
    R: AttachmentRepository,
{
    pub attachment_repo: R,
    pub storage: SharedBlobStorage,
}

impl<R> AttachmentHandler<R>
where
    R: AttachmentRepository,
{
    pub fn new(attachment_repo: R, storage: SharedBlobStorage) -> Self {
        AttachmentHandler { attachment_repo, storage }
    }

    /// Uploads the bytes and records the attachment. The blob is removed again
    /// if the record cannot be written.
    #[instrument(skip(self, request), fields(project_id = request.project_id, kind = %request.kind))]
    pub async fn attach(&self, request: NewAttachmentRequest) -> Result<Attachment, AppError> {
        request.validate()?;

        if request.kind == AttachmentKind::Image && !infer::is_image(&request.bytes) {
            return Err(AppError::invalid("bytes", "Upload is not a recognised image"));
        }

        let target = upload_path(request.kind, Utc::now().date_naive(), &request.original_name);
        let path = self.storage.save(&target, &request.bytes).await?;

        let insert = AttachmentInsert {
            project_id: request.project_id,
            kind: request.kind,
            path,
            original_name: request.original_name,
            desc: request.desc,
        };

        let created = match insert.validate() {
            Ok(()) => self.attachment_repo.create_attachment(&insert).await,
            Err(e) => Err(AppError::from(e)),
        };

        match created {
            Ok(attachment) => {
                info!(id = attachment.id, path = %attachment.path, "Attachment stored");
                Ok(attachment)
            }
            Err(e) => {
                release_blobs(self.storage.as_ref(), &[insert.path]).await;
                Err(e)
            }
        }
    }

    pub async fn get_attachment(&self, kind: AttachmentKind, id: &str) -> Result<Attachment, AppError> {
        let id = valid_id(id)?;
        self.attachment_repo.get_attachment_by_id(kind, id).await
    }

    /// Only the description is editable; replacing the bytes means a new attachment
    #[instrument(skip(self, request))]
    pub async fn update_attachment(
        &self,
        kind: AttachmentKind,
        id: &str,
        request: UpdateAttachmentRequest,
    ) -> Result<Attachment, AppError> {
        request.validate()?;

        let id = valid_id(id)?;
        self.attachment_repo.update_attachment_desc(kind, id, &request.desc).await
    }

    /// Deletes the record, then its blob. A failed blob delete is logged only
    #[instrument(skip(self))]
    pub async fn delete_attachment(&self, kind: AttachmentKind, id: &str) -> Result<(), AppError> {
        let id = valid_id(id)?;
        let removed = self.attachment_repo.delete_attachment(kind, id).await?;

        release_blobs(self.storage.as_ref(), std::slice::from_ref(&removed.path)).await;

        info!(id, path = %removed.path, "Attachment deleted");
        Ok(())
    }

    pub async fn list_attachments(&self, kind: AttachmentKind) -> Result<Vec<Attachment>, AppError> {
        self.attachment_repo.list_attachments(kind).await
    }

    pub async fn list_project_attachments(&self, kind: AttachmentKind, project_id: &str) -> Result<Vec<Attachment>, AppError> {
        let project_id = valid_id(project_id)?;
        self.attachment_repo.list_project_attachments(kind, project_id).await
    }

    /// Where the stored blob can be fetched from.
    pub fn attachment_url(&self, attachment: &Attachment) -> String {
        self.storage.url(&attachment.path)
    }
}
