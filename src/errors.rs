use std::borrow::Cow;
use std::fmt;

use derive_more::Display;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    NotFound(String),
    ConstraintViolation(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConstraintViolation(msg) => write!(f, "Constraint violation: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, AppError::ConstraintViolation(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, AppError::ValidationError(_))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::ConstraintViolation(format!(
                    "Duplicate value violates {}",
                    e.constraint().unwrap_or("a unique constraint")
                ))
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                AppError::ConstraintViolation(format!(
                    "Referenced record missing or still in use ({})",
                    e.constraint().unwrap_or("foreign key")
                ))
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23514")) => {
                AppError::ConstraintViolation(format!(
                    "Check constraint failed ({})",
                    e.constraint().unwrap_or("check")
                ))
            }
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Failed to store blob {_0}: {_1}")]
    Write(String, String),

    #[display("Failed to remove blob {_0}: {_1}")]
    Delete(String, String),
}

impl std::error::Error for StorageError {}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub(crate) fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
