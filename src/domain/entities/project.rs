use std::{cmp::Ordering, collections::BTreeSet, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    entities::{
        attachment::Attachment,
        category::Category,
        option_fields::OptionField,
        skill::Skill,
        testimony::Testimony,
    },
    errors::new_validation_error,
    validators::{resolve_slug, validate_not_blank, validate_slug, validate_url},
};

const MAX_NAME_LENGTH: u64 = 200;

// ───── Database Models ───────────────────────────────────────────────

/// A portfolio project. `skill_ids` is read from the join relation, sorted
/// ascending and free of duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: Option<String>,
    pub pull_quote: Option<String>,
    pub short_description: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: i64,
    pub skill_ids: Vec<i64>,
}

#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_date_range"))]
pub struct ProjectInsert {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[validate(custom(function = "validate_url"))]
    pub url: Option<String>,

    pub pull_quote: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub short_description: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: i64,
    pub skill_ids: BTreeSet<i64>,
}

// ───── API Response Models ──────────────────────────────────────────

/// A project with everything a detail page needs. Only live testimonies are
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub category: Category,
    pub skills: Vec<Skill>,
    pub files: Vec<Attachment>,
    pub images: Vec<Attachment>,
    pub testimonies: Vec<Testimony>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProjectRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,

    #[validate(custom(function = "validate_url"))]
    pub url: Option<String>,

    pub pull_quote: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub short_description: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: i64,

    #[serde(default)]
    pub skill_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: OptionField<String>,

    #[validate(length(min = 1))]
    pub slug: OptionField<String>,

    pub url: OptionField<String>,
    pub pull_quote: OptionField<String>,
    pub short_description: OptionField<String>,
    pub description: OptionField<String>,
    pub start_date: OptionField<NaiveDate>,
    pub end_date: OptionField<NaiveDate>,
    pub category_id: OptionField<i64>,

    /// Replaces the whole skill set when present.
    pub skill_ids: OptionField<Vec<i64>>,
}

// ───── Validation Helpers ───────────────────────────────────────────

fn validate_date_range(project: &ProjectInsert) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
        if end < start {
            return Err(new_validation_error("end_before_start", "End date must not be before start date"));
        }
    }
    Ok(())
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<NewProjectRequest> for ProjectInsert {
    type Error = ValidationErrors;

    fn try_from(value: NewProjectRequest) -> Result<Self, Self::Error> {
        value.validate()?;

        let insert = ProjectInsert {
            slug: resolve_slug(value.slug.as_deref(), &value.name)?,
            name: value.name,
            url: value.url,
            pull_quote: value.pull_quote,
            short_description: value.short_description,
            description: value.description,
            start_date: value.start_date,
            end_date: value.end_date,
            category_id: value.category_id,
            skill_ids: value.skill_ids.into_iter().collect(),
        };

        insert.validate()?;
        Ok(insert)
    }
}

impl UpdateProjectRequest {
    pub fn merge_into(self, current: Project) -> Result<ProjectInsert, ValidationErrors> {
        self.validate()?;

        let skill_ids = match self.skill_ids {
            OptionField::SetToValue(ids) => ids.into_iter().collect(),
            OptionField::SetToNull => BTreeSet::new(),
            OptionField::Unchanged => current.skill_ids.into_iter().collect(),
        };

        let insert = ProjectInsert {
            name: self.name.or_keep(current.name),
            slug: self.slug.or_keep(current.slug),
            url: self.url.or_keep_nullable(current.url),
            pull_quote: self.pull_quote.or_keep_nullable(current.pull_quote),
            short_description: self.short_description.or_keep(current.short_description),
            description: self.description.or_keep(current.description),
            start_date: self.start_date.or_keep_nullable(current.start_date),
            end_date: self.end_date.or_keep_nullable(current.end_date),
            category_id: self.category_id.or_keep(current.category_id),
            skill_ids,
        };

        insert.validate()?;
        Ok(insert)
    }
}

// ───── Ordering & Display ───────────────────────────────────────────

/// Descending with missing dates placed after all present ones.
fn desc_nulls_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Project {
    /// `start_date DESC NULLS LAST, end_date DESC NULLS LAST, id ASC`
    pub fn default_order(a: &Project, b: &Project) -> Ordering {
        desc_nulls_last(a.start_date, b.start_date)
            .then_with(|| desc_nulls_last(a.end_date, b.end_date))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn has_skill(&self, skill_id: i64) -> bool {
        self.skill_ids.binary_search(&skill_id).is_ok()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
