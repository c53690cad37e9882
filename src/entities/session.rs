//! Session entity - server-side record behind a session cookie.
//!
//! The row snapshots the identity at sign-in. Role and college never change for the lifetime
//! of a session; a fresh login is needed to pick up a different role.

use super::user::UserRole;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Random token carried by the cookie
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    /// Signed-in user
    pub user_id: i64,
    /// Username at sign-in
    pub username: String,
    /// Role at sign-in
    pub role: UserRole,
    /// College at sign-in
    pub college: Option<String>,
    /// When the session was opened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Session and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
