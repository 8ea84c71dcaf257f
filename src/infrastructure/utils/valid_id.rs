use crate::errors::AppError;

/// Parses an externally supplied record identifier.
pub fn valid_id(id: &str) -> Result<i64, AppError> {
    match id.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::invalid("id", "Identifier must be a positive integer")),
    }
}
