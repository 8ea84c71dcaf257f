use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{entities::attachment::AttachmentKind, errors::StorageError};

/// Longest path offered to a backend. Stays under the 255 character column
/// so a backend can still append a de-duplicating suffix.
pub const MAX_UPLOAD_PATH: usize = 240;

/// Persists uploaded bytes. Implemented outside this crate (filesystem,
/// object storage, ...).
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` at or near `path` and returns the path actually used,
    /// which may differ when the backend avoids overwriting an existing blob.
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public address of a stored blob.
    fn url(&self, path: &str) -> String;
}

pub type SharedBlobStorage = Arc<dyn BlobStorage>;

/// Deletes blobs whose records are already gone. Failures are logged only.
pub async fn release_blobs(storage: &dyn BlobStorage, paths: &[String]) {
    for path in paths {
        if let Err(e) = storage.delete(path).await {
            warn!("Failed to remove blob {}: {}", path, e);
        }
    }
}

static INVALID_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^-\w.]").expect("filename pattern is a valid regex")
});

/// Reduces an uploaded file name to something safe to use as a path segment.
pub fn valid_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let spaced = base.trim().replace(' ', "_");
    let cleaned = INVALID_FILENAME_CHARS.replace_all(&spaced, "");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Shortens `name` to `max_chars`, cutting the stem so the extension survives.
fn fit_file_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().count() < max_chars => {
            let keep = max_chars - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{stem}.{ext}")
        }
        _ => name.chars().take(max_chars).collect(),
    }
}

/// `<kind prefix>/<YYYY>/<MM>/<DD>/<name>`, at most [`MAX_UPLOAD_PATH`] characters.
pub fn upload_path(kind: AttachmentKind, date: NaiveDate, original_name: &str) -> String {
    let dir = format!("{}/{}", kind.upload_prefix(), date.format("%Y/%m/%d"));
    let budget = MAX_UPLOAD_PATH - dir.len() - 1;

    format!("{}/{}", dir, fit_file_name(&valid_file_name(original_name), budget))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn paths_are_grouped_by_kind_and_date() {
        assert_eq!(
            upload_path(AttachmentKind::File, day(), "report.pdf"),
            "project_file/2024/03/09/report.pdf"
        );
        assert_eq!(
            upload_path(AttachmentKind::Image, day(), "shot.png"),
            "project_image/2024/03/09/shot.png"
        );
    }

    #[test]
    fn file_names_are_cleaned() {
        assert_eq!(valid_file_name("my report (final).pdf"), "my_report_final.pdf");
        assert_eq!(valid_file_name("../../etc/passwd"), "passwd");
        assert_eq!(valid_file_name("C:\\Users\\me\\cv.doc"), "cv.doc");
        assert_eq!(valid_file_name("..."), "upload");
    }

    #[test]
    fn long_names_are_cut_before_the_extension() {
        let name = format!("{}.pdf", "a".repeat(251));
        let path = upload_path(AttachmentKind::Image, day(), &name);

        assert_eq!(path.chars().count(), MAX_UPLOAD_PATH);
        assert!(path.starts_with("project_image/2024/03/09/aaa"));
        assert!(path.ends_with("a.pdf"));
    }

    #[test]
    fn names_without_a_usable_extension_are_cut_plainly() {
        assert_eq!(fit_file_name("abcdef", 4), "abcd");
        assert_eq!(fit_file_name("ab.verylongext", 6), "ab.ver");
        assert_eq!(fit_file_name("short.txt", 20), "short.txt");
    }
}
