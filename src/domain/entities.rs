pub mod attachment;
pub mod category;
pub mod option_fields;
pub mod project;
pub mod skill;
pub mod testimony;
