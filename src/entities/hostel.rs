//! Hostel entity - a building run by one warden inside one college.
//!
//! `available_rooms` mirrors the number of unallocated rooms and is only ever changed inside the
//! same transaction that changes a room's allocation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hostel database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hostels")]
pub struct Model {
    /// Unique identifier for the hostel
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g. "Alpha")
    pub name: String,
    /// College the hostel serves
    pub college: String,
    /// Warden who created and runs the hostel
    pub warden_id: i64,
    /// Number of rooms created with the hostel
    pub total_rooms: i32,
    /// Rooms not yet allocated; 0 <= available_rooms <= total_rooms
    pub available_rooms: i32,
}

/// Defines relationships between Hostel and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each hostel belongs to one warden
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WardenId",
        to = "super::user::Column::Id"
    )]
    Warden,
    /// One hostel has many rooms
    #[sea_orm(has_many = "super::room::Entity")]
    Rooms,
    /// One hostel receives many applications
    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
    /// One hostel has many photos
    #[sea_orm(has_many = "super::room_photo::Entity")]
    Photos,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warden.def()
    }
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl Related<super::room_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
