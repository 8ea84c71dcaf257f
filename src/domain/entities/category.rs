use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    entities::option_fields::OptionField,
    validators::{resolve_slug, validate_not_blank, validate_slug},
};

const MAX_NAME_LENGTH: u64 = 200;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub position: i32,
}

#[derive(Debug, Clone, Validate)]
pub struct CategoryInsert {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,

    #[validate(range(min = 0, message = "Position must be a non-negative integer"))]
    pub position: i32,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCategoryRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    /// Derived from `name` when omitted.
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,

    #[validate(range(min = 0, message = "Position must be a non-negative integer"))]
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: OptionField<String>,

    #[validate(length(min = 1))]
    pub slug: OptionField<String>,

    pub position: OptionField<i32>,
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<NewCategoryRequest> for CategoryInsert {
    type Error = ValidationErrors;

    fn try_from(value: NewCategoryRequest) -> Result<Self, Self::Error> {
        value.validate()?;

        let insert = CategoryInsert {
            slug: resolve_slug(value.slug.as_deref(), &value.name)?,
            name: value.name,
            position: value.position,
        };

        insert.validate()?;
        Ok(insert)
    }
}

impl UpdateCategoryRequest {
    /// Applies the patch on top of `current`, producing the full row to write.
    pub fn merge_into(self, current: Category) -> Result<CategoryInsert, ValidationErrors> {
        self.validate()?;

        let insert = CategoryInsert {
            name: self.name.or_keep(current.name),
            slug: self.slug.or_keep(current.slug),
            position: self.position.or_keep(current.position),
        };

        insert.validate()?;
        Ok(insert)
    }
}

// ───── Ordering & Display ───────────────────────────────────────────

impl Category {
    /// Position ascending, slug breaks ties.
    pub fn default_order(a: &Category, b: &Category) -> Ordering {
        a.position
            .cmp(&b.position)
            .then_with(|| a.slug.cmp(&b.slug))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
