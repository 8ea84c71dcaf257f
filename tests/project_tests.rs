mod test_utils;

use portfolio_content::{
    entities::{
        attachment::AttachmentKind,
        option_fields::OptionField,
        project::UpdateProjectRequest,
        testimony::TestimonyStatus,
    },
    policy::{DeletePolicies, DeletePolicy},
    repositories::project::ProjectScope,
};
use test_utils::*;

#[tokio::test]
async fn projects_list_newest_first_with_undated_last() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    app.seed_project("Old", web.id, Some(date(2020, 1, 1))).await;
    app.seed_project("Undated", web.id, None).await;
    app.seed_project("New", web.id, Some(date(2021, 1, 1))).await;

    let names: Vec<String> = app.projects.list_projects().await.unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["New", "Old", "Undated"]);
}

#[tokio::test]
async fn end_date_breaks_start_date_ties() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;

    let mut short = valid_project("Short", web.id);
    short.start_date = Some(date(2022, 1, 1));
    short.end_date = Some(date(2022, 2, 1));
    let mut long = valid_project("Long", web.id);
    long.start_date = Some(date(2022, 1, 1));
    long.end_date = Some(date(2022, 9, 1));

    app.projects.create_project(short).await.unwrap();
    app.projects.create_project(long).await.unwrap();

    let names: Vec<String> = app.projects.list_projects().await.unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Long", "Short"]);
}

#[tokio::test]
async fn create_then_read_by_id_and_slug_match() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;

    let mut request = valid_project("Content Store", web.id);
    request.skill_ids = vec![rust.id];
    let created = app.projects.create_project(request).await.unwrap();

    assert_eq!(created.slug, "content-store");
    assert_eq!(created.skill_ids, vec![rust.id]);
    assert_eq!(app.projects.get_project(&created.id.to_string()).await.unwrap(), created);
    assert_eq!(app.projects.get_project_by_slug("content-store").await.unwrap(), created);
}

#[tokio::test]
async fn unknown_category_is_a_constraint_violation() {
    let app = TestApp::spawn();

    let err = app.projects.create_project(valid_project("Orphan", 42)).await.unwrap_err();

    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert!(app.projects.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_skill_is_a_constraint_violation() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;

    let mut request = valid_project("Portfolio", web.id);
    request.skill_ids = vec![7];
    let err = app.projects.create_project(request).await.unwrap_err();

    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn duplicate_project_slug_leaves_original_untouched() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let original = app.seed_project("Portfolio", web.id, Some(date(2023, 5, 1))).await;

    let err = app.projects.create_project(valid_project("Portfolio", web.id)).await.unwrap_err();

    assert!(err.is_constraint_violation());
    assert_eq!(app.projects.get_project_by_slug("portfolio").await.unwrap(), original);
}

#[tokio::test]
async fn end_before_start_is_a_validation_error() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;

    let mut request = valid_project("Backwards", web.id);
    request.start_date = Some(date(2023, 6, 1));
    request.end_date = Some(date(2023, 1, 1));

    assert!(app.projects.create_project(request).await.unwrap_err().is_validation_error());
}

#[tokio::test]
async fn skills_are_a_set_regardless_of_insertion_order() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;
    let sql = app.seed_skill("SQL").await;
    let project = app.seed_project("Portfolio", web.id, None).await;

    app.projects.add_skill(&project.id.to_string(), &sql.id.to_string()).await.unwrap();
    app.projects.add_skill(&project.id.to_string(), &rust.id.to_string()).await.unwrap();
    let project = app.projects.add_skill(&project.id.to_string(), &sql.id.to_string()).await.unwrap();

    assert_eq!(project.skill_ids, vec![rust.id, sql.id]);

    let names: Vec<String> = app.projects.list_project_skills(&project.id.to_string()).await.unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Rust", "SQL"]);

    let project = app.projects.remove_skill(&project.id.to_string(), &rust.id.to_string()).await.unwrap();
    assert_eq!(project.skill_ids, vec![sql.id]);
}

#[tokio::test]
async fn listing_by_category_and_skill() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let cli = app.seed_category("CLI", 1).await;
    let rust = app.seed_skill("Rust").await;

    let site = app.seed_project("Site", web.id, Some(date(2022, 1, 1))).await;
    let tool = app.seed_project("Tool", cli.id, Some(date(2023, 1, 1))).await;
    app.projects.add_skill(&tool.id.to_string(), &rust.id.to_string()).await.unwrap();

    let in_web = app.projects.list_projects_by_category("web").await.unwrap();
    assert_eq!(in_web.iter().map(|p| p.id).collect::<Vec<_>>(), vec![site.id]);

    let with_rust = app.projects.list_projects_by_skill("rust").await.unwrap();
    assert_eq!(with_rust.iter().map(|p| p.id).collect::<Vec<_>>(), vec![tool.id]);

    let by_id = app.projects.list_projects_in(ProjectScope::Skill(rust.id)).await.unwrap();
    assert_eq!(by_id, with_rust);

    assert!(app.projects.list_projects_by_category("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn deleting_a_skill_unlinks_it_from_projects() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    app.projects.add_skill(&project.id.to_string(), &rust.id.to_string()).await.unwrap();

    app.skills.delete_skill(&rust.id.to_string()).await.unwrap();

    let project = app.projects.get_project(&project.id.to_string()).await.unwrap();
    assert!(project.skill_ids.is_empty());
}

#[tokio::test]
async fn update_replaces_skill_set_only_when_given() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;
    let go = app.seed_skill("Go").await;

    let mut request = valid_project("Portfolio", web.id);
    request.skill_ids = vec![rust.id];
    let project = app.projects.create_project(request).await.unwrap();
    let id = project.id.to_string();

    let rename = UpdateProjectRequest {
        name: OptionField::SetToValue("Portfolio v2".into()),
        ..Default::default()
    };
    let renamed = app.projects.update_project(&id, rename).await.unwrap();
    assert_eq!(renamed.name, "Portfolio v2");
    assert_eq!(renamed.slug, "portfolio");
    assert_eq!(renamed.skill_ids, vec![rust.id]);

    let reskill = UpdateProjectRequest {
        skill_ids: OptionField::SetToValue(vec![go.id]),
        url: OptionField::SetToNull,
        ..Default::default()
    };
    let reskilled = app.projects.update_project(&id, reskill).await.unwrap();
    assert_eq!(reskilled.skill_ids, vec![go.id]);
    assert_eq!(reskilled.url, None);
}

#[tokio::test]
async fn project_delete_cascades_to_attachments_and_testimonies() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    app.seed_testimony(project.id, "Ada", TestimonyStatus::Live).await;
    let brief = app.attachments
        .attach(upload(project.id, AttachmentKind::File, "brief.pdf", b"%PDF-1.4".to_vec()))
        .await
        .unwrap();
    let shot = app.attachments
        .attach(upload(project.id, AttachmentKind::Image, "shot.png", png_bytes()))
        .await
        .unwrap();

    app.projects.delete_project(&project.id.to_string()).await.unwrap();

    assert!(app.projects.get_project_by_slug("portfolio").await.unwrap_err().is_not_found());
    assert!(app.testimonies.list_testimonies(Default::default()).await.unwrap().is_empty());
    assert!(app.attachments.list_attachments(AttachmentKind::File).await.unwrap().is_empty());
    assert!(!app.blobs.contains(&brief.path));
    assert!(!app.blobs.contains(&shot.path));
    assert_eq!(app.blobs.len(), 0);
}

#[tokio::test]
async fn restricted_project_delete_keeps_everything() {
    let app = TestApp::with_policies(DeletePolicies {
        category: DeletePolicy::Restrict,
        project: DeletePolicy::Restrict,
    });
    let web = app.seed_category("Web", 0).await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    app.seed_testimony(project.id, "Ada", TestimonyStatus::Hidden).await;
    let notes = app.attachments
        .attach(upload(project.id, AttachmentKind::File, "notes.txt", b"notes".to_vec()))
        .await
        .unwrap();

    let err = app.projects.delete_project(&project.id.to_string()).await.unwrap_err();

    assert!(err.is_constraint_violation());
    assert!(app.projects.get_project_by_slug("portfolio").await.is_ok());
    assert_eq!(app.testimonies.list_testimonies(Default::default()).await.unwrap().len(), 1);
    assert!(app.blobs.contains(&notes.path));
}

#[tokio::test]
async fn skill_links_reject_malformed_ids() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    let project_id = project.id.to_string();

    let bad_project = app.projects.add_skill("abc", &rust.id.to_string()).await.unwrap_err();
    assert!(bad_project.is_validation_error());

    let bad_skill = app.projects.remove_skill(&project_id, "-3").await.unwrap_err();
    assert!(bad_skill.is_validation_error());

    assert!(app.projects.list_project_skills("").await.unwrap_err().is_validation_error());
    assert!(app.projects.list_project_skills("999").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn detail_contains_only_live_testimonies() {
    let app = TestApp::spawn();
    let web = app.seed_category("Web", 0).await;
    let rust = app.seed_skill("Rust").await;
    let project = app.seed_project("Portfolio", web.id, None).await;
    app.projects.add_skill(&project.id.to_string(), &rust.id.to_string()).await.unwrap();

    let live = app.seed_testimony(project.id, "Ada", TestimonyStatus::Live).await;
    app.seed_testimony(project.id, "Grace", TestimonyStatus::Hidden).await;
    app.seed_testimony(project.id, "Linus", TestimonyStatus::NeedsApproval).await;

    app.attachments
        .attach(upload(project.id, AttachmentKind::Image, "shot.png", png_bytes()))
        .await
        .unwrap();

    let detail = app.projects.get_project_detail("portfolio").await.unwrap();

    assert_eq!(detail.category, web);
    assert_eq!(detail.skills, vec![rust]);
    assert_eq!(detail.testimonies, vec![live]);
    assert_eq!(detail.images.len(), 1);
    assert!(detail.files.is_empty());
}
