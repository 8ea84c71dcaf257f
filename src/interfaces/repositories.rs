pub mod attachment;
pub mod category;
pub mod memory;
pub mod project;
pub mod skill;
pub mod sqlx_repo;
pub mod testimony;
