use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    entities::{option_fields::OptionField, project::Project},
    errors::AppError,
    utils::sanitize::sanitize_statement,
    validators::{validate_not_blank, validate_url},
};

const MAX_NAME_LENGTH: u64 = 100;
const MAX_COMPANY_LENGTH: u64 = 100;
const SUMMARY_STATEMENT_CHARS: usize = 35;

// ───── Moderation ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum TestimonyStatus {
    Hidden = 0,
    Live = 1,
    #[default]
    NeedsApproval = 2,
}

impl TestimonyStatus {
    pub fn code(&self) -> i16 {
        *self as i16
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestimonyStatus::Hidden => "Hidden",
            TestimonyStatus::Live => "Live",
            TestimonyStatus::NeedsApproval => "Needs Approval",
        }
    }
}

impl TryFrom<i32> for TestimonyStatus {
    type Error = AppError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TestimonyStatus::Hidden),
            1 => Ok(TestimonyStatus::Live),
            2 => Ok(TestimonyStatus::NeedsApproval),
            other => Err(AppError::invalid(
                "status",
                format!("{} is not a testimony status (expected 0, 1 or 2)", other),
            )),
        }
    }
}

impl fmt::Display for TestimonyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which testimonies a read path may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestimonyFilter {
    /// Every testimony regardless of status.
    #[default]
    All,
    /// Only testimonies approved for public display.
    Live,
}

impl TestimonyFilter {
    /// Status a store must match, if any.
    pub fn required_status(&self) -> Option<TestimonyStatus> {
        match self {
            TestimonyFilter::All => None,
            TestimonyFilter::Live => Some(TestimonyStatus::Live),
        }
    }

    pub fn matches(&self, testimony: &Testimony) -> bool {
        self.required_status()
            .is_none_or(|status| testimony.status == status)
    }
}

pub fn is_live(testimony: &Testimony) -> bool {
    TestimonyFilter::Live.matches(testimony)
}

/// Keeps only live testimonies from any collection.
pub fn live_only<'a, I>(testimonies: I) -> impl Iterator<Item = &'a Testimony>
where
    I: IntoIterator<Item = &'a Testimony>,
{
    testimonies.into_iter().filter(|t| is_live(t))
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Testimony {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub from_url: Option<String>,
    pub from_company: Option<String>,
    /// Raw markup as submitted. Untrusted.
    pub statement: String,
    pub status: TestimonyStatus,
    /// Stamped with the current date on every save, not only on creation.
    pub date_added: Option<NaiveDate>,
}

#[derive(Debug, Clone, Validate)]
pub struct TestimonyInsert {
    pub project_id: i64,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_url"))]
    pub from_url: Option<String>,

    #[validate(length(max = MAX_COMPANY_LENGTH))]
    pub from_company: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub statement: String,

    pub status: TestimonyStatus,
    pub date_added: NaiveDate,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// A visitor submission. Status defaults to `NeedsApproval`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTestimonyRequest {
    pub project_id: i64,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_url"))]
    pub from_url: Option<String>,

    #[validate(length(max = MAX_COMPANY_LENGTH))]
    pub from_company: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub statement: String,

    #[serde(default)]
    pub status: TestimonyStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateTestimonyRequest {
    pub project_id: OptionField<i64>,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: OptionField<String>,

    pub from_url: OptionField<String>,

    #[validate(length(max = MAX_COMPANY_LENGTH))]
    pub from_company: OptionField<String>,

    pub statement: OptionField<String>,
    pub status: OptionField<TestimonyStatus>,
}

// ───── Insert Preparation Logic ─────────────────────────────────────

impl NewTestimonyRequest {
    pub fn prepare_for_insert(self, today: NaiveDate) -> Result<TestimonyInsert, ValidationErrors> {
        self.validate()?;

        let insert = TestimonyInsert {
            project_id: self.project_id,
            name: self.name,
            from_url: self.from_url,
            from_company: self.from_company,
            statement: self.statement,
            status: self.status,
            date_added: today,
        };

        insert.validate()?;
        Ok(insert)
    }
}

impl UpdateTestimonyRequest {
    pub fn merge_into(self, current: Testimony, today: NaiveDate) -> Result<TestimonyInsert, ValidationErrors> {
        self.validate()?;

        let insert = TestimonyInsert {
            project_id: self.project_id.or_keep(current.project_id),
            name: self.name.or_keep(current.name),
            from_url: self.from_url.or_keep_nullable(current.from_url),
            from_company: self.from_company.or_keep_nullable(current.from_company),
            statement: self.statement.or_keep(current.statement),
            status: self.status.or_keep(current.status),
            date_added: today,
        };

        insert.validate()?;
        Ok(insert)
    }
}

// ───── Display ──────────────────────────────────────────────────────

impl Testimony {
    pub fn is_live(&self) -> bool {
        is_live(self)
    }

    /// `"<statement start>... - <name> (<project>)"`, as shown in listings.
    pub fn summary(&self, project: &Project) -> String {
        let head: String = self.statement.chars().take(SUMMARY_STATEMENT_CHARS).collect();
        format!("{}... - {} ({})", head, self.name, project.name)
    }

    /// The statement with unsafe markup stripped, for direct display.
    pub fn statement_html(&self) -> String {
        sanitize_statement(&self.statement)
    }
}
