use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validators::validate_not_blank;

/// Project files and project images share one shape; the kind tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File = 0,
    Image = 1,
}

impl AttachmentKind {
    /// Top-level directory for uploads of this kind.
    pub fn upload_prefix(&self) -> &'static str {
        match self {
            AttachmentKind::File => "project_file",
            AttachmentKind::Image => "project_image",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttachmentKind::File => "file",
            AttachmentKind::Image => "image",
        };
        write!(f, "{s}")
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: i64,
    pub project_id: i64,
    pub kind: AttachmentKind,
    /// Reference returned by the blob store.
    pub path: String,
    pub original_name: String,
    pub desc: String,
}

#[derive(Debug, Clone, Validate)]
pub struct AttachmentInsert {
    pub project_id: i64,
    pub kind: AttachmentKind,

    #[validate(length(min = 1, max = 255, message = "Stored path must be between 1 and 255 characters"))]
    pub path: String,

    #[validate(length(min = 1, max = 255))]
    pub original_name: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub desc: String,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Validate)]
pub struct NewAttachmentRequest {
    pub project_id: i64,
    pub kind: AttachmentKind,

    #[validate(length(min = 1, max = 255, message = "File name must be between 1 and 255 characters"))]
    pub original_name: String,

    #[validate(length(min = 1, message = "Upload cannot be empty"))]
    pub bytes: Vec<u8>,

    #[validate(custom(function = "validate_not_blank"))]
    pub desc: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAttachmentRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub desc: String,
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}
