//! Attendance entity - append-only log of a warden marking a student for a date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student being marked
    pub student_id: i64,
    /// Warden who recorded the entry
    pub warden_id: i64,
    /// Day the entry refers to
    pub date: Date,
    /// Free-form status such as "present" or "absent"
    pub status: String,
}

/// Defines relationships between Attendance and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The subject of the entry
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    /// The recorder of the entry
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WardenId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Warden,
}

// Joins to users go through the subject; the recorder is filtered by id.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
