pub mod sanitize;
pub mod valid_id;
