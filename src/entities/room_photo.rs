//! Room photo entity - a stored image of a hostel, uploaded by its warden.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Room photo database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room_photos")]
pub struct Model {
    /// Unique identifier for the photo
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Hostel shown in the photo
    pub hostel_id: i64,
    /// Uploading warden
    pub warden_id: i64,
    /// Blob name in upload storage
    pub filename: String,
}

/// Defines relationships between `RoomPhoto` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each photo belongs to one hostel
    #[sea_orm(
        belongs_to = "super::hostel::Entity",
        from = "Column::HostelId",
        to = "super::hostel::Column::Id",
        on_delete = "Cascade"
    )]
    Hostel,
    /// Each photo was uploaded by one warden
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::WardenId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Warden,
}

impl Related<super::hostel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Hostel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
