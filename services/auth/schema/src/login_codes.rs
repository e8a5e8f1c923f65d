use sea_orm::entity::prelude::*;

/// One-time login code sent to a user by SMS.
///
/// At most one row per `username` has `deleted_at IS NULL` (partial unique index).
/// Consumed codes are soft-deleted, never physically removed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "login_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub code: String,
    pub expiry_time: chrono::DateTime<chrono::Utc>,
    /// `PENDING`, `SUCCESS` or `FAILED`.
    pub status: String,
    pub response_meta: Option<Json>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
