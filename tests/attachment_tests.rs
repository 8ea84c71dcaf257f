mod test_utils;

use chrono::Utc;
use portfolio_content::{
    entities::attachment::{AttachmentKind, UpdateAttachmentRequest},
    storage::blob::MAX_UPLOAD_PATH,
};
use test_utils::*;

async fn app_with_project() -> (TestApp, i64) {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    (app, project.id)
}

#[tokio::test]
async fn uploads_land_under_a_dated_path() {
    let (app, project_id) = app_with_project().await;

    let file = app.attachments
        .attach(upload(project_id, AttachmentKind::File, "design notes.pdf", b"%PDF-1.7".to_vec()))
        .await
        .unwrap();

    let expected = format!(
        "project_file/{}/design_notes.pdf",
        Utc::now().date_naive().format("%Y/%m/%d")
    );
    assert_eq!(file.path, expected);
    assert_eq!(file.original_name, "design notes.pdf");
    assert!(app.blobs.contains(&file.path));
    assert_eq!(app.attachments.attachment_url(&file), format!("/media/{expected}"));
}

#[tokio::test]
async fn path_returned_by_the_blob_store_is_recorded() {
    let (app, project_id) = app_with_project().await;

    let first = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, "shot.png", png_bytes()))
        .await
        .unwrap();
    let second = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, "shot.png", png_bytes()))
        .await
        .unwrap();

    assert_ne!(first.path, second.path);
    assert!(second.path.ends_with("shot_1.png"));
    assert_eq!(app.blobs.len(), 2);
}

#[tokio::test]
async fn longest_accepted_name_still_fits_the_stored_path() {
    let (app, project_id) = app_with_project().await;
    let name = format!("{}.pdf", "a".repeat(251));

    let first = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, &name, png_bytes()))
        .await
        .unwrap();
    let second = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, &name, png_bytes()))
        .await
        .unwrap();

    assert_eq!(first.original_name, name);
    assert!(first.path.ends_with(".pdf"));
    assert!(first.path.chars().count() <= MAX_UPLOAD_PATH);
    assert!(second.path.chars().count() <= 255);
    assert_ne!(first.path, second.path);
}

#[tokio::test]
async fn non_image_bytes_are_rejected_for_images() {
    let (app, project_id) = app_with_project().await;

    let err = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, "fake.png", b"not an image".to_vec()))
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(app.blobs.len(), 0);
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let (app, project_id) = app_with_project().await;

    let err = app.attachments
        .attach(upload(project_id, AttachmentKind::File, "empty.txt", Vec::new()))
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
}

#[tokio::test]
async fn unknown_project_fails_and_releases_the_blob() {
    let app = TestApp::spawn();

    let err = app.attachments
        .attach(upload(404, AttachmentKind::File, "orphan.txt", b"hello".to_vec()))
        .await
        .unwrap_err();

    assert!(err.is_constraint_violation());
    assert_eq!(app.blobs.len(), 0);
}

#[tokio::test]
async fn files_and_images_are_kept_apart() {
    let (app, project_id) = app_with_project().await;
    let file = app.attachments
        .attach(upload(project_id, AttachmentKind::File, "notes.txt", b"notes".to_vec()))
        .await
        .unwrap();
    let image = app.attachments
        .attach(upload(project_id, AttachmentKind::Image, "shot.png", png_bytes()))
        .await
        .unwrap();

    let files = app.attachments.list_project_attachments(AttachmentKind::File, &project_id.to_string()).await.unwrap();
    let images = app.attachments.list_attachments(AttachmentKind::Image).await.unwrap();
    assert_eq!(files, vec![file.clone()]);
    assert_eq!(images, vec![image.clone()]);

    let wrong_kind = app.attachments
        .get_attachment(AttachmentKind::Image, &file.id.to_string())
        .await
        .unwrap_err();
    assert!(wrong_kind.is_not_found());
}

#[tokio::test]
async fn description_can_be_edited() {
    let (app, project_id) = app_with_project().await;
    let file = app.attachments
        .attach(upload(project_id, AttachmentKind::File, "notes.txt", b"notes".to_vec()))
        .await
        .unwrap();

    let updated = app.attachments
        .update_attachment(
            AttachmentKind::File,
            &file.id.to_string(),
            UpdateAttachmentRequest { desc: "Meeting notes".into() },
        )
        .await
        .unwrap();
    assert_eq!(updated.desc, "Meeting notes");
    assert_eq!(updated.path, file.path);

    let blank = app.attachments
        .update_attachment(
            AttachmentKind::File,
            &file.id.to_string(),
            UpdateAttachmentRequest { desc: " ".into() },
        )
        .await
        .unwrap_err();
    assert!(blank.is_validation_error());
}

#[tokio::test]
async fn delete_removes_record_and_blob() {
    let (app, project_id) = app_with_project().await;
    let file = app.attachments
        .attach(upload(project_id, AttachmentKind::File, "notes.txt", b"notes".to_vec()))
        .await
        .unwrap();

    app.attachments
        .delete_attachment(AttachmentKind::File, &file.id.to_string())
        .await
        .unwrap();

    assert!(!app.blobs.contains(&file.path));
    assert!(app.attachments
        .get_attachment(AttachmentKind::File, &file.id.to_string())
        .await
        .unwrap_err()
        .is_not_found());
}
