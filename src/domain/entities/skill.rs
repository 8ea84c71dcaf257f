use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    entities::option_fields::OptionField,
    validators::{resolve_slug, validate_not_blank, validate_slug},
};

const MAX_NAME_LENGTH: u64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Validate)]
pub struct SkillInsert {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSkillRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateSkillRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: OptionField<String>,

    #[validate(length(min = 1))]
    pub slug: OptionField<String>,
}

impl TryFrom<NewSkillRequest> for SkillInsert {
    type Error = ValidationErrors;

    fn try_from(value: NewSkillRequest) -> Result<Self, Self::Error> {
        value.validate()?;

        let insert = SkillInsert {
            slug: resolve_slug(value.slug.as_deref(), &value.name)?,
            name: value.name,
        };

        insert.validate()?;
        Ok(insert)
    }
}

impl UpdateSkillRequest {
    pub fn merge_into(self, current: Skill) -> Result<SkillInsert, ValidationErrors> {
        self.validate()?;

        let insert = SkillInsert {
            name: self.name.or_keep(current.name),
            slug: self.slug.or_keep(current.slug),
        };

        insert.validate()?;
        Ok(insert)
    }
}

impl Skill {
    /// Alphabetical by name; slug keeps equal names stable.
    pub fn default_order(a: &Skill, b: &Skill) -> Ordering {
        a.name.cmp(&b.name).then_with(|| a.slug.cmp(&b.slug))
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_longer_than_fifty_is_rejected() {
        let request = NewSkillRequest { name: "x".repeat(51), slug: Some("x".into()) };
        assert!(SkillInsert::try_from(request).is_err());
    }

    #[test]
    fn skills_sort_by_name() {
        let rust = Skill { id: 1, name: "Rust".into(), slug: "rust".into() };
        let go = Skill { id: 2, name: "Go".into(), slug: "go".into() };
        let mut skills = vec![rust.clone(), go.clone()];
        skills.sort_by(Skill::default_order);
        assert_eq!(skills, vec![go, rust]);
    }
}
