//! Application entity - a student's request for a room in a hostel.
//!
//! Status only ever moves from pending to approved; approval happens together with a room
//! allocation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Waiting for a principal
    #[sea_orm(string_value = "pending")]
    Pending,
    /// A room was allocated
    #[sea_orm(string_value = "approved")]
    Approved,
}

/// Application database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    /// Unique identifier for the application
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Applying student
    pub student_id: i64,
    /// Requested hostel
    pub hostel_id: i64,
    /// Current status
    pub status: ApplicationStatus,
    /// When the application was submitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Application and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each application is filed by one student
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    /// Each application targets one hostel
    #[sea_orm(
        belongs_to = "super::hostel::Entity",
        from = "Column::HostelId",
        to = "super::hostel::Column::Id",
        on_delete = "Cascade"
    )]
    Hostel,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::hostel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hostel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
