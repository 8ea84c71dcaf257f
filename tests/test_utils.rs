#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use portfolio_content::{
    entities::{
        attachment::{AttachmentKind, NewAttachmentRequest},
        category::{Category, NewCategoryRequest},
        project::{NewProjectRequest, Project},
        skill::{NewSkillRequest, Skill},
        testimony::{NewTestimonyRequest, Testimony, TestimonyStatus},
    },
    errors::StorageError,
    policy::DeletePolicies,
    repositories::memory::MemoryStore,
    storage::blob::{BlobStorage, SharedBlobStorage},
    use_cases::{
        attachment::AttachmentHandler, category::CategoryHandler, project::ProjectHandler,
        skill::SkillHandler, testimony::TestimonyHandler,
    },
};

/// Blob store double. Avoids overwriting by suffixing the file name, the way
/// real storage backends do.
#[derive(Clone, Default)]
pub struct FakeBlobStorage {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl FakeBlobStorage {
    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }
}

#[async_trait]
impl BlobStorage for FakeBlobStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let mut blobs = self.blobs.lock();

        let mut candidate = path.to_string();
        let mut n = 1;
        while blobs.contains_key(&candidate) {
            candidate = match path.rsplit_once('.') {
                Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
                None => format!("{path}_{n}"),
            };
            n += 1;
        }

        blobs.insert(candidate.clone(), bytes.to_vec());
        Ok(candidate)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.blobs.lock().remove(path);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("/media/{path}")
    }
}

pub type TestProjectHandler = ProjectHandler<MemoryStore, MemoryStore, MemoryStore, MemoryStore, MemoryStore>;

pub struct TestApp {
    pub store: MemoryStore,
    pub blobs: FakeBlobStorage,
    pub categories: CategoryHandler<MemoryStore>,
    pub skills: SkillHandler<MemoryStore>,
    pub projects: TestProjectHandler,
    pub attachments: AttachmentHandler<MemoryStore>,
    pub testimonies: TestimonyHandler<MemoryStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_policies(DeletePolicies::default())
    }

    pub fn with_policies(policies: DeletePolicies) -> Self {
        let store = MemoryStore::new(policies);
        let blobs = FakeBlobStorage::default();
        let storage: SharedBlobStorage = Arc::new(blobs.clone());

        TestApp {
            categories: CategoryHandler::new(store.clone(), storage.clone()),
            skills: SkillHandler::new(store.clone()),
            projects: ProjectHandler::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                storage.clone(),
            ),
            attachments: AttachmentHandler::new(store.clone(), storage),
            testimonies: TestimonyHandler::new(store.clone()),
            store,
            blobs,
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn valid_category(name: &str, position: i32) -> NewCategoryRequest {
    NewCategoryRequest {
        name: name.to_string(),
        slug: None,
        position,
    }
}

pub fn valid_skill(name: &str) -> NewSkillRequest {
    NewSkillRequest {
        name: name.to_string(),
        slug: None,
    }
}

pub fn valid_project(name: &str, category_id: i64) -> NewProjectRequest {
    NewProjectRequest {
        name: name.to_string(),
        slug: None,
        url: Some("https://example.com/project".into()),
        pull_quote: None,
        short_description: format!("{name} in one line"),
        description: format!("{name} described at length"),
        start_date: None,
        end_date: None,
        category_id,
        skill_ids: Vec::new(),
    }
}

pub fn valid_testimony(project_id: i64, name: &str) -> NewTestimonyRequest {
    NewTestimonyRequest {
        project_id,
        name: name.to_string(),
        from_url: Some("https://example.com/about".into()),
        from_company: Some("Example Ltd".into()),
        statement: format!("{name} was very happy with the work delivered on this project."),
        status: TestimonyStatus::default(),
    }
}

/// Smallest byte sequence `infer` recognises as a PNG.
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R']
}

pub fn upload(project_id: i64, kind: AttachmentKind, name: &str, bytes: Vec<u8>) -> NewAttachmentRequest {
    NewAttachmentRequest {
        project_id,
        kind,
        original_name: name.to_string(),
        bytes,
        desc: format!("Upload {name}"),
    }
}

#[async_trait]
pub trait ContentTestHelpers: Send + Sync {
    async fn seed_category(&self, name: &str, position: i32) -> Category;
    async fn seed_skill(&self, name: &str) -> Skill;
    async fn seed_project(&self, name: &str, category_id: i64, start_date: Option<NaiveDate>) -> Project;
    async fn seed_testimony(&self, project_id: i64, name: &str, status: TestimonyStatus) -> Testimony;
}

#[async_trait]
impl ContentTestHelpers for TestApp {
    async fn seed_category(&self, name: &str, position: i32) -> Category {
        self.categories
            .create_category(valid_category(name, position))
            .await
            .expect("Failed to seed category")
    }

    async fn seed_skill(&self, name: &str) -> Skill {
        self.skills
            .create_skill(valid_skill(name))
            .await
            .expect("Failed to seed skill")
    }

    async fn seed_project(&self, name: &str, category_id: i64, start_date: Option<NaiveDate>) -> Project {
        let mut request = valid_project(name, category_id);
        request.start_date = start_date;

        self.projects
            .create_project(request)
            .await
            .expect("Failed to seed project")
    }

    async fn seed_testimony(&self, project_id: i64, name: &str, status: TestimonyStatus) -> Testimony {
        let mut request = valid_testimony(project_id, name);
        request.status = status;

        self.testimonies
            .submit_testimony(request)
            .await
            .expect("Failed to seed testimony")
    }
}
