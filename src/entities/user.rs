//! User entity - every account in the system, whatever its role.
//!
//! Accounts start unapproved (except the bootstrap admin) and cannot sign in until an
//! authorized role flips `approved`. Admins carry no college; every other role is bound to one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The four account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Approves principals
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Approves students and wardens of one college, allocates rooms
    #[sea_orm(string_value = "principal")]
    Principal,
    /// Runs hostels, rooms, attendance and photos
    #[sea_orm(string_value = "warden")]
    Warden,
    /// Applies for hostel rooms
    #[sea_orm(string_value = "student")]
    Student,
}

impl UserRole {
    /// Path segment and label used by the HTTP surface.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Principal => "principal",
            Self::Warden => "warden",
            Self::Student => "student",
        }
    }

    /// Parses a lowercase role name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "principal" => Some(Self::Principal),
            "warden" => Some(Self::Warden),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all roles
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string; never the plaintext password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role
    pub role: UserRole,
    /// College (tenant) this account belongs to; None only for admins
    pub college: Option<String>,
    /// Whether the account may sign in
    pub approved: bool,
    /// Stored blob name of the student's id card
    pub id_card: Option<String>,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A warden runs many hostels
    #[sea_orm(has_many = "super::hostel::Entity")]
    Hostels,
    /// A student files many applications
    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
}

impl Related<super::hostel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hostels.def()
    }
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
