pub mod entities;
pub mod policy;
pub mod use_cases;
pub mod validators;
