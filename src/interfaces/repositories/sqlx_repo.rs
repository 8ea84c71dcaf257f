use sqlx::PgPool;

use crate::policy::DeletePolicies;

#[derive(Clone)]
pub struct SqlxCategoryRepo {
    pub pool: PgPool,
    pub policies: DeletePolicies,
}

#[derive(Clone)]
pub struct SqlxSkillRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxProjectRepo {
    pub pool: PgPool,
    pub policies: DeletePolicies,
}

#[derive(Clone)]
pub struct SqlxAttachmentRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxTestimonyRepo {
    pub pool: PgPool,
}
