use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::{
    entities::{
        attachment::{Attachment, AttachmentInsert, AttachmentKind},
        category::{Category, CategoryInsert},
        project::{Project, ProjectInsert},
        skill::{Skill, SkillInsert},
        testimony::{Testimony, TestimonyFilter, TestimonyInsert, TestimonyStatus},
    },
    errors::AppError,
    policy::{DeletePolicies, DeletePolicy},
    repositories::{
        attachment::AttachmentRepository,
        category::CategoryRepository,
        project::{ProjectRepository, ProjectScope},
        skill::SkillRepository,
        testimony::TestimonyRepository,
    },
};

#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table { rows: BTreeMap::new(), last_id: 0 }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: Table<Category>,
    skills: Table<Skill>,
    /// `skill_ids` is left empty here; links live in `project_skills`.
    projects: Table<Project>,
    project_skills: BTreeSet<(i64, i64)>,
    attachments: Table<Attachment>,
    testimonies: Table<Testimony>,
}

impl Tables {
    fn skill_ids_of(&self, project_id: i64) -> Vec<i64> {
        self.project_skills
            .range((project_id, i64::MIN)..=(project_id, i64::MAX))
            .map(|&(_, skill_id)| skill_id)
            .collect()
    }

    fn hydrate(&self, project: &Project) -> Project {
        Project {
            skill_ids: self.skill_ids_of(project.id),
            ..project.clone()
        }
    }

    fn check_project_refs(&self, project: &ProjectInsert) -> Result<(), AppError> {
        if !self.categories.rows.contains_key(&project.category_id) {
            return Err(AppError::ConstraintViolation("Project category does not exist".into()));
        }
        if project.skill_ids.iter().any(|id| !self.skills.rows.contains_key(id)) {
            return Err(AppError::ConstraintViolation("Linked skill does not exist".into()));
        }
        Ok(())
    }

    fn check_project_exists(&self, project_id: i64, what: &str) -> Result<(), AppError> {
        if self.projects.rows.contains_key(&project_id) {
            Ok(())
        } else {
            Err(AppError::ConstraintViolation(format!("{} project does not exist", what)))
        }
    }

    fn replace_project_skills(&mut self, project_id: i64, skill_ids: &BTreeSet<i64>) {
        self.project_skills.retain(|&(p, _)| p != project_id);
        self.project_skills
            .extend(skill_ids.iter().map(|&skill_id| (project_id, skill_id)));
    }

    /// All-or-nothing: a restricted project blocks the whole batch. Returns
    /// the deleted count and the blob paths of removed attachments.
    fn delete_projects(&mut self, project_ids: &[i64], policy: DeletePolicy) -> Result<(u64, Vec<String>), AppError> {
        let ids: BTreeSet<i64> = project_ids.iter().copied().collect();
        let mut blob_paths = Vec::new();

        match policy {
            DeletePolicy::Restrict => {
                let has_dependents = self.attachments.rows.values().any(|a| ids.contains(&a.project_id))
                    || self.testimonies.rows.values().any(|t| ids.contains(&t.project_id));
                if has_dependents {
                    return Err(AppError::ConstraintViolation(
                        "Project still has files, images or testimonies".into(),
                    ));
                }
            }
            DeletePolicy::Cascade => {
                blob_paths = self.attachments.rows.values()
                    .filter(|a| ids.contains(&a.project_id))
                    .map(|a| a.path.clone())
                    .collect();
                self.attachments.rows.retain(|_, a| !ids.contains(&a.project_id));
                self.testimonies.rows.retain(|_, t| !ids.contains(&t.project_id));
            }
        }

        self.project_skills.retain(|(p, _)| !ids.contains(p));

        let mut deleted = 0;
        for id in &ids {
            if self.projects.rows.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok((deleted, blob_paths))
    }
}

/// In-process content store with the same constraints, ordering and delete
/// policies as the Postgres repositories. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    policies: DeletePolicies,
}

impl MemoryStore {
    pub fn new(policies: DeletePolicies) -> Self {
        MemoryStore {
            tables: Arc::default(),
            policies,
        }
    }
}

fn slug_taken<'a, I>(mut slugs: I, slug: &str, except: Option<i64>) -> bool
where
    I: Iterator<Item = (i64, &'a str)>,
{
    slugs.any(|(id, s)| s == slug && Some(id) != except)
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create_category(&self, category: &CategoryInsert) -> Result<Category, AppError> {
        let mut tables = self.tables.write();

        let slugs = tables.categories.rows.values().map(|c| (c.id, c.slug.as_str()));
        if slug_taken(slugs, &category.slug, None) {
            return Err(AppError::ConstraintViolation("Category slug already exists".into()));
        }

        let id = tables.categories.next_id();
        let created = Category {
            id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            position: category.position,
        };
        tables.categories.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn get_category_by_id(&self, id: i64) -> Result<Category, AppError> {
        self.tables.read().categories.rows.get(&id).cloned()
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, AppError> {
        self.tables.read().categories.rows.values().find(|c| c.slug == slug).cloned()
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn update_category(&self, id: i64, category: &CategoryInsert) -> Result<Category, AppError> {
        let mut tables = self.tables.write();

        if !tables.categories.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        let slugs = tables.categories.rows.values().map(|c| (c.id, c.slug.as_str()));
        if slug_taken(slugs, &category.slug, Some(id)) {
            return Err(AppError::ConstraintViolation("Category slug already exists".into()));
        }

        let updated = Category {
            id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            position: category.position,
        };
        tables.categories.rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_category(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write();

        if !tables.categories.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        let project_ids: Vec<i64> = tables.projects.rows.values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();

        if !project_ids.is_empty() {
            match self.policies.category {
                DeletePolicy::Restrict => {
                    return Err(AppError::ConstraintViolation(format!(
                        "Category {} still has {} project(s)",
                        id,
                        project_ids.len()
                    )));
                }
                DeletePolicy::Cascade => {
                    let (_, blob_paths) = tables.delete_projects(&project_ids, self.policies.project)?;
                    tables.categories.rows.remove(&id);
                    return Ok(blob_paths);
                }
            }
        }

        tables.categories.rows.remove(&id);
        Ok(Vec::new())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self.tables.read().categories.rows.values().cloned().collect();
        categories.sort_by(Category::default_order);
        Ok(categories)
    }
}

#[async_trait]
impl SkillRepository for MemoryStore {
    async fn create_skill(&self, skill: &SkillInsert) -> Result<Skill, AppError> {
        let mut tables = self.tables.write();

        let slugs = tables.skills.rows.values().map(|s| (s.id, s.slug.as_str()));
        if slug_taken(slugs, &skill.slug, None) {
            return Err(AppError::ConstraintViolation("Skill slug already exists".into()));
        }

        let id = tables.skills.next_id();
        let created = Skill { id, name: skill.name.clone(), slug: skill.slug.clone() };
        tables.skills.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn get_skill_by_id(&self, id: i64) -> Result<Skill, AppError> {
        self.tables.read().skills.rows.get(&id).cloned()
            .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", id)))
    }

    async fn get_skill_by_slug(&self, slug: &str) -> Result<Skill, AppError> {
        self.tables.read().skills.rows.values().find(|s| s.slug == slug).cloned()
            .ok_or_else(|| AppError::NotFound(format!("Skill '{}' not found", slug)))
    }

    async fn update_skill(&self, id: i64, skill: &SkillInsert) -> Result<Skill, AppError> {
        let mut tables = self.tables.write();

        if !tables.skills.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Skill {} not found", id)));
        }
        let slugs = tables.skills.rows.values().map(|s| (s.id, s.slug.as_str()));
        if slug_taken(slugs, &skill.slug, Some(id)) {
            return Err(AppError::ConstraintViolation("Skill slug already exists".into()));
        }

        let updated = Skill { id, name: skill.name.clone(), slug: skill.slug.clone() };
        tables.skills.rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_skill(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write();

        if tables.skills.rows.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Skill {} not found", id)));
        }
        tables.project_skills.retain(|&(_, skill_id)| skill_id != id);
        Ok(())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, AppError> {
        let mut skills: Vec<Skill> = self.tables.read().skills.rows.values().cloned().collect();
        skills.sort_by(Skill::default_order);
        Ok(skills)
    }

    async fn list_project_skills(&self, project_id: i64) -> Result<Vec<Skill>, AppError> {
        let tables = self.tables.read();
        let mut skills: Vec<Skill> = tables.skill_ids_of(project_id).iter()
            .filter_map(|id| tables.skills.rows.get(id).cloned())
            .collect();
        skills.sort_by(Skill::default_order);
        Ok(skills)
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create_project(&self, project: &ProjectInsert) -> Result<Project, AppError> {
        let mut tables = self.tables.write();

        let slugs = tables.projects.rows.values().map(|p| (p.id, p.slug.as_str()));
        if slug_taken(slugs, &project.slug, None) {
            return Err(AppError::ConstraintViolation("Project slug already exists".into()));
        }
        tables.check_project_refs(project)?;

        let id = tables.projects.next_id();
        let created = Project {
            id,
            name: project.name.clone(),
            slug: project.slug.clone(),
            url: project.url.clone(),
            pull_quote: project.pull_quote.clone(),
            short_description: project.short_description.clone(),
            description: project.description.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            category_id: project.category_id,
            skill_ids: Vec::new(),
        };
        tables.projects.rows.insert(id, created.clone());
        tables.replace_project_skills(id, &project.skill_ids);

        Ok(tables.hydrate(&created))
    }

    async fn get_project_by_id(&self, id: i64) -> Result<Project, AppError> {
        let tables = self.tables.read();
        tables.projects.rows.get(&id)
            .map(|p| tables.hydrate(p))
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
    }

    async fn get_project_by_slug(&self, slug: &str) -> Result<Project, AppError> {
        let tables = self.tables.read();
        tables.projects.rows.values()
            .find(|p| p.slug == slug)
            .map(|p| tables.hydrate(p))
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", slug)))
    }

    async fn update_project(&self, id: i64, project: &ProjectInsert) -> Result<Project, AppError> {
        let mut tables = self.tables.write();

        if !tables.projects.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }
        let slugs = tables.projects.rows.values().map(|p| (p.id, p.slug.as_str()));
        if slug_taken(slugs, &project.slug, Some(id)) {
            return Err(AppError::ConstraintViolation("Project slug already exists".into()));
        }
        tables.check_project_refs(project)?;

        let updated = Project {
            id,
            name: project.name.clone(),
            slug: project.slug.clone(),
            url: project.url.clone(),
            pull_quote: project.pull_quote.clone(),
            short_description: project.short_description.clone(),
            description: project.description.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            category_id: project.category_id,
            skill_ids: Vec::new(),
        };
        tables.projects.rows.insert(id, updated.clone());
        tables.replace_project_skills(id, &project.skill_ids);

        Ok(tables.hydrate(&updated))
    }

    async fn delete_project(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write();

        if !tables.projects.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }
        let (_, blob_paths) = tables.delete_projects(&[id], self.policies.project)?;
        Ok(blob_paths)
    }

    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, AppError> {
        let tables = self.tables.read();
        let mut projects: Vec<Project> = tables.projects.rows.values()
            .map(|p| tables.hydrate(p))
            .filter(|p| scope.includes(p))
            .collect();
        projects.sort_by(Project::default_order);
        Ok(projects)
    }

    async fn add_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write();

        tables.check_project_exists(project_id, "Linked")?;
        if !tables.skills.rows.contains_key(&skill_id) {
            return Err(AppError::ConstraintViolation("Linked skill does not exist".into()));
        }
        tables.project_skills.insert((project_id, skill_id));
        Ok(())
    }

    async fn remove_project_skill(&self, project_id: i64, skill_id: i64) -> Result<(), AppError> {
        self.tables.write().project_skills.remove(&(project_id, skill_id));
        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for MemoryStore {
    async fn create_attachment(&self, attachment: &AttachmentInsert) -> Result<Attachment, AppError> {
        let mut tables = self.tables.write();

        tables.check_project_exists(attachment.project_id, "Attachment")?;

        let id = tables.attachments.next_id();
        let created = Attachment {
            id,
            project_id: attachment.project_id,
            kind: attachment.kind,
            path: attachment.path.clone(),
            original_name: attachment.original_name.clone(),
            desc: attachment.desc.clone(),
        };
        tables.attachments.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn get_attachment_by_id(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError> {
        self.tables.read().attachments.rows.get(&id)
            .filter(|a| a.kind == kind)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Project {} {} not found", kind, id)))
    }

    async fn update_attachment_desc(&self, kind: AttachmentKind, id: i64, desc: &str) -> Result<Attachment, AppError> {
        let mut tables = self.tables.write();
        match tables.attachments.rows.get_mut(&id) {
            Some(attachment) if attachment.kind == kind => {
                attachment.desc = desc.to_string();
                Ok(attachment.clone())
            }
            _ => Err(AppError::NotFound(format!("Project {} {} not found", kind, id))),
        }
    }

    async fn delete_attachment(&self, kind: AttachmentKind, id: i64) -> Result<Attachment, AppError> {
        let mut tables = self.tables.write();
        let found = tables.attachments.rows.get(&id).is_some_and(|a| a.kind == kind);
        if !found {
            return Err(AppError::NotFound(format!("Project {} {} not found", kind, id)));
        }
        tables.attachments.rows.remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Project {} {} not found", kind, id)))
    }

    async fn list_attachments(&self, kind: AttachmentKind) -> Result<Vec<Attachment>, AppError> {
        Ok(self.tables.read().attachments.rows.values()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect())
    }

    async fn list_project_attachments(&self, kind: AttachmentKind, project_id: i64) -> Result<Vec<Attachment>, AppError> {
        Ok(self.tables.read().attachments.rows.values()
            .filter(|a| a.kind == kind && a.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TestimonyRepository for MemoryStore {
    async fn create_testimony(&self, testimony: &TestimonyInsert) -> Result<Testimony, AppError> {
        let mut tables = self.tables.write();

        tables.check_project_exists(testimony.project_id, "Testimony")?;

        let id = tables.testimonies.next_id();
        let created = Testimony {
            id,
            project_id: testimony.project_id,
            name: testimony.name.clone(),
            from_url: testimony.from_url.clone(),
            from_company: testimony.from_company.clone(),
            statement: testimony.statement.clone(),
            status: testimony.status,
            date_added: Some(testimony.date_added),
        };
        tables.testimonies.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn get_testimony_by_id(&self, id: i64) -> Result<Testimony, AppError> {
        self.tables.read().testimonies.rows.get(&id).cloned()
            .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))
    }

    async fn update_testimony(&self, id: i64, testimony: &TestimonyInsert) -> Result<Testimony, AppError> {
        let mut tables = self.tables.write();

        if !tables.testimonies.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Testimony {} not found", id)));
        }
        tables.check_project_exists(testimony.project_id, "Testimony")?;

        let updated = Testimony {
            id,
            project_id: testimony.project_id,
            name: testimony.name.clone(),
            from_url: testimony.from_url.clone(),
            from_company: testimony.from_company.clone(),
            statement: testimony.statement.clone(),
            status: testimony.status,
            date_added: Some(testimony.date_added),
        };
        tables.testimonies.rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn set_testimony_status(
        &self,
        id: i64,
        status: TestimonyStatus,
        date_added: NaiveDate,
    ) -> Result<Testimony, AppError> {
        let mut tables = self.tables.write();
        let testimony = tables.testimonies.rows.get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))?;

        testimony.status = status;
        testimony.date_added = Some(date_added);
        Ok(testimony.clone())
    }

    async fn delete_testimony(&self, id: i64) -> Result<(), AppError> {
        self.tables.write().testimonies.rows.remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Testimony {} not found", id)))
    }

    async fn list_testimonies(&self, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        Ok(self.tables.read().testimonies.rows.values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn list_project_testimonies(&self, project_id: i64, filter: TestimonyFilter) -> Result<Vec<Testimony>, AppError> {
        Ok(self.tables.read().testimonies.rows.values()
            .filter(|t| t.project_id == project_id && filter.matches(t))
            .cloned()
            .collect())
    }
}
