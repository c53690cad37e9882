//! Room entity - one bed-space in a hostel, numbered `R1..Rn` at hostel creation.
//! `is_allocated` is true exactly when `student_id` is set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Room database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    /// Unique identifier; also the first-fit ordering key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Hostel this room belongs to
    pub hostel_id: i64,
    /// Room label such as "R1"
    pub room_number: String,
    /// Whether a student holds this room
    pub is_allocated: bool,
    /// The student holding this room
    pub student_id: Option<i64>,
}

/// Defines relationships between Room and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each room belongs to one hostel
    #[sea_orm(
        belongs_to = "super::hostel::Entity",
        from = "Column::HostelId",
        to = "super::hostel::Column::Id",
        on_delete = "Cascade"
    )]
    Hostel,
    /// The student the room is allocated to
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::hostel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hostel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
